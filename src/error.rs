use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failures in the fetch, extract and emit layers.
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("archive could not be read: {0}")]
    Archive(#[from] zip::result::ZipError),
    #[error("templates directory not found in archive: {}", .0.display())]
    MissingTemplates(PathBuf),
    #[error("taxonomy document is malformed: {0}")]
    Taxonomy(#[from] serde_json::Error),
    #[error("csv write failed: {0}")]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, HarvestError>;
