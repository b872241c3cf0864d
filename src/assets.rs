//! Startup asset fetches
//!
//! Two one-shot loads run concurrently: the galaxy catalog and the redshift
//! table. Each reports through a channel the viewer drains once per frame.
//! A failure is logged and leaves that feature unavailable; nothing retries.

use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::sync::mpsc::{self, UnboundedReceiver};

use crate::catalog::{Catalog, CatalogError};
use crate::config::{Config, Environment};
use crate::redshift::{RedshiftError, RedshiftTable};

#[derive(Error, Debug)]
pub enum AssetError {
    #[error("{url} returned status {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Redshift(#[from] RedshiftError),
    #[error("Decode task failed: {0}")]
    Task(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Catalog,
    RedshiftTable,
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetKind::Catalog => write!(f, "galaxy catalog"),
            AssetKind::RedshiftTable => write!(f, "redshift table"),
        }
    }
}

/// Completed load, delivered to the UI thread
#[derive(Debug)]
pub enum AssetEvent {
    Catalog(Result<Catalog, AssetError>),
    RedshiftTable(Result<RedshiftTable, AssetError>),
}

/// Where an asset lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetSource {
    Url(String),
    Path(PathBuf),
}

fn is_url(s: &str) -> bool {
    s.starts_with("http://") || s.starts_with("https://")
}

impl AssetSource {
    /// Resolve a configured source against an optional base (directory or URL)
    pub fn resolve(location: &str, base: Option<&str>) -> Self {
        if is_url(location) {
            return AssetSource::Url(location.to_string());
        }
        if Path::new(location).is_absolute() {
            return AssetSource::Path(PathBuf::from(location));
        }
        match base {
            Some(b) if is_url(b) => AssetSource::Url(format!(
                "{}/{}",
                b.trim_end_matches('/'),
                location.trim_start_matches("./")
            )),
            Some(b) => AssetSource::Path(Path::new(b).join(location)),
            None => AssetSource::Path(PathBuf::from(location)),
        }
    }
}

impl fmt::Display for AssetSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetSource::Url(url) => write!(f, "{}", url),
            AssetSource::Path(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Fetch raw bytes from a URL or local file
pub async fn fetch_bytes(source: &AssetSource) -> Result<Vec<u8>, AssetError> {
    match source {
        AssetSource::Url(url) => {
            tracing::debug!("Fetching from: {}", url);

            let client = reqwest::Client::new();
            let response = client
                .get(url)
                .header("User-Agent", "GalaxyFlyer/0.1")
                .send()
                .await?;

            if !response.status().is_success() {
                return Err(AssetError::Status {
                    url: url.clone(),
                    status: response.status(),
                });
            }

            let bytes = response.bytes().await?;
            tracing::debug!("Downloaded {} bytes from {}", bytes.len(), url);
            Ok(bytes.to_vec())
        }
        AssetSource::Path(path) => {
            let bytes = tokio::fs::read(path).await.map_err(|source| AssetError::Io {
                path: path.clone(),
                source,
            })?;
            tracing::debug!("Read {} bytes from {:?}", bytes.len(), path);
            Ok(bytes)
        }
    }
}

/// Fetch and decode the galaxy catalog; decoding runs off the async workers
pub async fn load_catalog(source: &AssetSource, scale_factor: f64) -> Result<Catalog, AssetError> {
    tracing::info!("Loading galaxy catalog from {}", source);
    let bytes = fetch_bytes(source).await?;
    let catalog = tokio::task::spawn_blocking(move || Catalog::from_bytes(&bytes, scale_factor))
        .await
        .map_err(|e| AssetError::Task(e.to_string()))??;
    tracing::info!("Catalog loaded: {} galaxies", catalog.len());
    Ok(catalog)
}

pub async fn load_redshift_table(source: &AssetSource) -> Result<RedshiftTable, AssetError> {
    tracing::info!("Loading redshift table from {}", source);
    let bytes = fetch_bytes(source).await?;
    let table = RedshiftTable::from_json(&bytes)?;
    tracing::info!("Redshift table loaded: {}", table);
    Ok(table)
}

/// Start both loads as independent tasks on the current runtime
pub fn spawn_loaders(config: &Config, env: &Environment) -> UnboundedReceiver<AssetEvent> {
    let (tx, rx) = mpsc::unbounded_channel();
    let base = env.asset_base.as_deref();

    let catalog_source = AssetSource::resolve(&config.assets.catalog, base);
    let table_source = AssetSource::resolve(&config.assets.redshift_table, base);
    let scale_factor = config.dataset.scale_factor;

    let catalog_tx = tx.clone();
    tokio::spawn(async move {
        let result = load_catalog(&catalog_source, scale_factor).await;
        if catalog_tx.send(AssetEvent::Catalog(result)).is_err() {
            tracing::debug!("Viewer closed before catalog arrived");
        }
    });

    tokio::spawn(async move {
        let result = load_redshift_table(&table_source).await;
        if tx.send(AssetEvent::RedshiftTable(result)).is_err() {
            tracing::debug!("Viewer closed before redshift table arrived");
        }
    });

    rx
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_sources() {
        assert_eq!(
            AssetSource::resolve("https://example.org/g.json.gz", Some("/data")),
            AssetSource::Url("https://example.org/g.json.gz".to_string())
        );
        assert_eq!(
            AssetSource::resolve("data/g.json.gz", None),
            AssetSource::Path(PathBuf::from("data/g.json.gz"))
        );
        assert_eq!(
            AssetSource::resolve("./data/g.json.gz", Some("https://cdn.example.org/flyer/")),
            AssetSource::Url("https://cdn.example.org/flyer/data/g.json.gz".to_string())
        );
        assert_eq!(
            AssetSource::resolve("g.json", Some("/srv/assets")),
            AssetSource::Path(PathBuf::from("/srv/assets/g.json"))
        );
    }

    #[tokio::test]
    async fn test_missing_file_is_an_error() {
        let source = AssetSource::Path(PathBuf::from("does/not/exist.json"));
        let err = load_redshift_table(&source).await.unwrap_err();
        assert!(matches!(err, AssetError::Io { .. }));
    }

    #[tokio::test]
    async fn test_loads_local_table() {
        let path = std::env::temp_dir().join(format!("galaxy_flyer_table_{}.json", std::process::id()));
        std::fs::write(&path, "[[0,0.0],[100,0.5],[200,1.0]]").unwrap();
        let table = load_redshift_table(&AssetSource::Path(path.clone())).await.unwrap();
        assert_eq!(table.len(), 3);
        std::fs::remove_file(&path).ok();
    }

    #[tokio::test]
    async fn test_undersized_table_fails_fast() {
        let path = std::env::temp_dir().join(format!("galaxy_flyer_small_{}.json", std::process::id()));
        std::fs::write(&path, "[[0,0.0]]").unwrap();
        let err = load_redshift_table(&AssetSource::Path(path.clone())).await.unwrap_err();
        assert!(matches!(err, AssetError::Redshift(RedshiftError::TooFewSamples(1))));
        std::fs::remove_file(&path).ok();
    }
}
