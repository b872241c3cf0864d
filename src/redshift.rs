//! Redshift lookup table
//!
//! Maps comoving distance to redshift by linear interpolation between
//! tabulated samples. The table is built once from the fetched asset and
//! never mutated afterwards.

use serde::Deserialize;
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum RedshiftError {
    #[error("Redshift table needs at least 2 samples, got {0}")]
    TooFewSamples(usize),
    #[error("Non-finite sample at index {0}")]
    NonFinite(usize),
    #[error("Distances must be strictly increasing (index {index}: {previous} -> {current})")]
    NotIncreasing {
        index: usize,
        previous: f64,
        current: f64,
    },
    #[error("Column length mismatch: {distances} distances, {redshifts} redshifts")]
    ColumnMismatch { distances: usize, redshifts: usize },
    #[error("Invalid redshift table JSON: {0}")]
    Json(String),
}

/// Result of a table lookup
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Redshift {
    Value(f64),
    /// Query fell outside the tabulated distance range
    OutOfRange,
}

/// On-disk layouts accepted for the table asset
#[derive(Deserialize)]
#[serde(untagged)]
enum TableAsset {
    Pairs(Vec<(f64, f64)>),
    Columns {
        distance: Vec<f64>,
        redshift: Vec<f64>,
    },
}

#[derive(Debug, Clone)]
pub struct RedshiftTable {
    distances: Vec<f64>,
    redshifts: Vec<f64>,
}

impl RedshiftTable {
    /// Build a table from (comoving_distance, redshift) samples
    pub fn new(samples: Vec<(f64, f64)>) -> Result<Self, RedshiftError> {
        if samples.len() < 2 {
            return Err(RedshiftError::TooFewSamples(samples.len()));
        }

        let mut distances = Vec::with_capacity(samples.len());
        let mut redshifts = Vec::with_capacity(samples.len());

        for (i, (d, z)) in samples.into_iter().enumerate() {
            if !d.is_finite() || !z.is_finite() {
                return Err(RedshiftError::NonFinite(i));
            }
            if let Some(&previous) = distances.last() {
                if d <= previous {
                    return Err(RedshiftError::NotIncreasing {
                        index: i,
                        previous,
                        current: d,
                    });
                }
            }
            distances.push(d);
            redshifts.push(z);
        }

        Ok(Self { distances, redshifts })
    }

    /// Parse the JSON asset: either `[[d, z], ...]` or `{"distance": [...], "redshift": [...]}`
    pub fn from_json(bytes: &[u8]) -> Result<Self, RedshiftError> {
        let asset: TableAsset =
            serde_json::from_slice(bytes).map_err(|e| RedshiftError::Json(e.to_string()))?;
        let samples = match asset {
            TableAsset::Pairs(pairs) => pairs,
            TableAsset::Columns { distance, redshift } => {
                if distance.len() != redshift.len() {
                    return Err(RedshiftError::ColumnMismatch {
                        distances: distance.len(),
                        redshifts: redshift.len(),
                    });
                }
                distance.into_iter().zip(redshift).collect()
            }
        };
        Self::new(samples)
    }

    pub fn len(&self) -> usize {
        self.distances.len()
    }

    pub fn min_distance(&self) -> f64 {
        self.distances[0]
    }

    pub fn max_distance(&self) -> f64 {
        self.distances[self.distances.len() - 1]
    }

    pub fn max_redshift(&self) -> f64 {
        self.redshifts[self.redshifts.len() - 1]
    }

    /// Interpolate the redshift at `distance`.
    ///
    /// Valid range is `[first, last)`: the last sample itself already counts
    /// as out of range, matching the "greater than the maximum" display.
    pub fn lookup(&self, distance: f64) -> Redshift {
        if !distance.is_finite() || distance < self.min_distance() || distance >= self.max_distance() {
            return Redshift::OutOfRange;
        }

        // Index of the first sample strictly greater than `distance`; always in 1..len
        let upper = self.distances.partition_point(|&d| d <= distance);
        let lower = upper - 1;

        let (d0, d1) = (self.distances[lower], self.distances[upper]);
        let (z0, z1) = (self.redshifts[lower], self.redshifts[upper]);
        let t = (distance - d0) / (d1 - d0);

        Redshift::Value(z0 + t * (z1 - z0))
    }

    /// Text for the HUD info block
    pub fn display(&self, distance: f64) -> String {
        match self.lookup(distance) {
            Redshift::Value(z) => format!("{:.2}", z),
            Redshift::OutOfRange => format!("> {}", self.max_redshift()),
        }
    }
}

impl fmt::Display for RedshiftTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} samples, distance {:.1}..{:.1}, redshift {:.3}..{:.3}",
            self.len(),
            self.min_distance(),
            self.max_distance(),
            self.redshifts[0],
            self.max_redshift()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> RedshiftTable {
        RedshiftTable::new(vec![(0.0, 0.0), (100.0, 0.5), (200.0, 1.0)]).unwrap()
    }

    fn value(r: Redshift) -> f64 {
        match r {
            Redshift::Value(z) => z,
            Redshift::OutOfRange => panic!("expected a value"),
        }
    }

    #[test]
    fn test_interpolates_between_samples() {
        let t = table();
        assert!((value(t.lookup(150.0)) - 0.75).abs() < 1e-12);
        assert!((value(t.lookup(25.0)) - 0.125).abs() < 1e-12);
    }

    #[test]
    fn test_exact_at_samples() {
        let t = table();
        assert_eq!(t.lookup(0.0), Redshift::Value(0.0));
        assert_eq!(t.lookup(100.0), Redshift::Value(0.5));
    }

    #[test]
    fn test_out_of_range() {
        let t = table();
        assert_eq!(t.lookup(-0.001), Redshift::OutOfRange);
        assert_eq!(t.lookup(200.0), Redshift::OutOfRange);
        assert_eq!(t.lookup(500.0), Redshift::OutOfRange);
        assert_eq!(t.lookup(f64::NAN), Redshift::OutOfRange);
    }

    #[test]
    fn test_monotone_on_uneven_table() {
        let t = RedshiftTable::new(vec![(0.0, 0.0), (10.0, 0.01), (1000.0, 0.4), (4000.0, 2.0), (8000.0, 6.0)])
            .unwrap();
        let mut previous = 0.0;
        let mut d = 0.0;
        while d < 8000.0 {
            let z = value(t.lookup(d));
            assert!(z >= previous, "lookup({}) = {} < {}", d, z, previous);
            previous = z;
            d += 37.5;
        }
    }

    #[test]
    fn test_binary_search_matches_linear_scan() {
        let samples: Vec<(f64, f64)> = (0..50).map(|i| (i as f64 * i as f64, i as f64 * 0.1)).collect();
        let t = RedshiftTable::new(samples.clone()).unwrap();
        for q in [0.5, 3.0, 99.9, 400.0, 1234.5, 2400.0] {
            let i = samples.iter().position(|&(d, _)| d > q).unwrap();
            let (d0, z0) = samples[i - 1];
            let (d1, z1) = samples[i];
            let expected = z0 + (q - d0) / (d1 - d0) * (z1 - z0);
            assert!((value(t.lookup(q)) - expected).abs() < 1e-12);
        }
    }

    #[test]
    fn test_rejects_small_tables() {
        assert_eq!(RedshiftTable::new(vec![]).unwrap_err(), RedshiftError::TooFewSamples(0));
        assert_eq!(
            RedshiftTable::new(vec![(1.0, 0.1)]).unwrap_err(),
            RedshiftError::TooFewSamples(1)
        );
    }

    #[test]
    fn test_rejects_unsorted_tables() {
        let err = RedshiftTable::new(vec![(0.0, 0.0), (5.0, 0.1), (5.0, 0.2)]).unwrap_err();
        assert!(matches!(err, RedshiftError::NotIncreasing { index: 2, .. }));
        let err = RedshiftTable::new(vec![(0.0, 0.0), (f64::INFINITY, 0.1)]).unwrap_err();
        assert_eq!(err, RedshiftError::NonFinite(1));
    }

    #[test]
    fn test_from_json_layouts() {
        let pairs = RedshiftTable::from_json(br#"[[0,0.0],[100,0.5],[200,1.0]]"#).unwrap();
        assert_eq!(pairs.len(), 3);
        let columns =
            RedshiftTable::from_json(br#"{"distance":[0,100,200],"redshift":[0.0,0.5,1.0]}"#).unwrap();
        assert_eq!(columns.lookup(150.0), pairs.lookup(150.0));
        assert_eq!(
            RedshiftTable::from_json(br#"{"distance":[0,1],"redshift":[0.0]}"#).unwrap_err(),
            RedshiftError::ColumnMismatch { distances: 2, redshifts: 1 }
        );
        assert!(matches!(RedshiftTable::from_json(b"not json"), Err(RedshiftError::Json(_))));
        assert!(RedshiftTable::from_json(b"[[0,0.0]]").is_err());
    }

    #[test]
    fn test_display() {
        let t = table();
        assert_eq!(t.display(150.0), "0.75");
        assert_eq!(t.display(500.0), "> 1");
    }
}
