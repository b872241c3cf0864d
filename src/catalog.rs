//! Galaxy catalog
//!
//! Asset layout: JSON array of `[x, y, z, category_index]`, usually gzipped.
//! Coordinates are catalog units; the scale factor is applied on load.

use flate2::read::GzDecoder;
use std::io::Read;
use thiserror::Error;

/// Gzip magic bytes
const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Failed to decompress catalog: {0}")]
    Decompress(#[from] std::io::Error),
    #[error("Invalid catalog JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Unknown category {category} at row {row}")]
    UnknownCategory { row: usize, category: i64 },
    #[error("Non-finite coordinate at row {0}")]
    NonFinite(usize),
}

/// Survey tracer class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    /// Bright galaxy survey
    Bgs,
    /// Luminous red galaxies
    Lrg,
    /// Emission line galaxies
    Elg,
    /// Quasars
    Qso,
}

impl Category {
    pub const ALL: [Category; 4] = [Category::Bgs, Category::Lrg, Category::Elg, Category::Qso];

    pub fn from_index(index: i64) -> Option<Self> {
        match index {
            0 => Some(Category::Bgs),
            1 => Some(Category::Lrg),
            2 => Some(Category::Elg),
            3 => Some(Category::Qso),
            _ => None,
        }
    }

    /// Fixed RGB per class
    pub fn color(self) -> [f32; 3] {
        match self {
            Category::Bgs => [1.0, 0.8, 0.5],
            Category::Lrg => [1.0, 0.5, 0.5],
            Category::Elg => [0.5, 1.0, 0.5],
            Category::Qso => [0.8, 0.5, 1.0],
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Category::Bgs => "BGS",
            Category::Lrg => "LRG",
            Category::Elg => "ELG",
            Category::Qso => "QSO",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Galaxy {
    /// Scene-space position
    pub position: [f32; 3],
    pub category: Category,
}

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    pub galaxies: Vec<Galaxy>,
}

impl Catalog {
    /// Decode raw asset bytes, gunzipping when needed
    pub fn from_bytes(bytes: &[u8], scale_factor: f64) -> Result<Self, CatalogError> {
        if bytes.starts_with(&GZIP_MAGIC) {
            let mut json = Vec::new();
            GzDecoder::new(bytes).read_to_end(&mut json)?;
            tracing::debug!("Decompressed catalog: {} -> {} bytes", bytes.len(), json.len());
            Self::from_json(&json, scale_factor)
        } else {
            Self::from_json(bytes, scale_factor)
        }
    }

    pub fn from_json(json: &[u8], scale_factor: f64) -> Result<Self, CatalogError> {
        let rows: Vec<(f64, f64, f64, i64)> = serde_json::from_slice(json)?;

        let galaxies = rows
            .into_iter()
            .enumerate()
            .map(|(row, (x, y, z, c))| {
                if !(x.is_finite() && y.is_finite() && z.is_finite()) {
                    return Err(CatalogError::NonFinite(row));
                }
                let category =
                    Category::from_index(c).ok_or(CatalogError::UnknownCategory { row, category: c })?;
                Ok(Galaxy {
                    position: [
                        (x * scale_factor) as f32,
                        (y * scale_factor) as f32,
                        (z * scale_factor) as f32,
                    ],
                    category,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { galaxies })
    }

    pub fn len(&self) -> usize {
        self.galaxies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.galaxies.is_empty()
    }

    /// Galaxy count per category, in category order
    pub fn counts(&self) -> [(Category, usize); 4] {
        let mut counts = Category::ALL.map(|c| (c, 0usize));
        for g in &self.galaxies {
            counts[g.category as usize].1 += 1;
        }
        counts
    }

    /// Axis-aligned bounds in scene units, `None` when empty
    pub fn bounds(&self) -> Option<([f32; 3], [f32; 3])> {
        let first = self.galaxies.first()?.position;
        Some(self.galaxies.iter().fold((first, first), |(mut lo, mut hi), g| {
            for i in 0..3 {
                lo[i] = lo[i].min(g.position[i]);
                hi[i] = hi[i].max(g.position[i]);
            }
            (lo, hi)
        }))
    }

    /// Every n-th galaxy so that at most `max_points` remain
    pub fn subsample(&self, max_points: usize) -> Vec<Galaxy> {
        if self.galaxies.len() <= max_points {
            return self.galaxies.clone();
        }
        let step = self.galaxies.len().div_ceil(max_points.max(1));
        self.galaxies.iter().step_by(step).copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    const THREE: &str = "[[100,0,0,0],[0,200,0,1],[0,0,-300,2]]";

    #[test]
    fn test_parse_and_scale() {
        let catalog = Catalog::from_json(THREE.as_bytes(), 0.5).unwrap();
        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog.galaxies[0].position, [50.0, 0.0, 0.0]);
        assert_eq!(catalog.galaxies[2].category, Category::Elg);
        assert_eq!(catalog.galaxies[2].category.color(), [0.5, 1.0, 0.5]);
    }

    #[test]
    fn test_gzip_detected() {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(THREE.as_bytes()).unwrap();
        let gz = encoder.finish().unwrap();

        let catalog = Catalog::from_bytes(&gz, 1.0).unwrap();
        assert_eq!(catalog.len(), 3);
        let counts = catalog.counts();
        assert_eq!(counts[0], (Category::Bgs, 1));
        assert_eq!(counts[3], (Category::Qso, 0));
    }

    #[test]
    fn test_unknown_category() {
        let err = Catalog::from_json(b"[[1,2,3,0],[1,2,3,7]]", 1.0).unwrap_err();
        assert!(matches!(err, CatalogError::UnknownCategory { row: 1, category: 7 }));
    }

    #[test]
    fn test_bounds_and_subsample() {
        let catalog = Catalog::from_json(THREE.as_bytes(), 1.0).unwrap();
        let (lo, hi) = catalog.bounds().unwrap();
        assert_eq!(lo, [0.0, 0.0, -300.0]);
        assert_eq!(hi, [100.0, 200.0, 0.0]);
        assert_eq!(catalog.subsample(2).len(), 2);
        assert_eq!(catalog.subsample(10).len(), 3);
        assert!(Catalog::default().bounds().is_none());
    }

    #[test]
    fn test_subsample_never_exceeds_limit() {
        let galaxy = Galaxy {
            position: [0.0; 3],
            category: Category::Bgs,
        };
        for (total, max_points) in [(10_007usize, 100usize), (100_001, 1_000), (299_999, 300), (1_000, 999)] {
            let catalog = Catalog {
                galaxies: vec![galaxy; total],
            };
            let kept = catalog.subsample(max_points).len();
            assert!(kept <= max_points, "{} of {} kept for limit {}", kept, total, max_points);
            assert!(kept * 2 >= max_points, "{} of {} kept for limit {}", kept, total, max_points);
        }
        assert!(Catalog::default().subsample(10).is_empty());
    }
}
