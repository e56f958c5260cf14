//! Error type shared by the library.
//!
//! Only configuration and plumbing failures are errors. A failed quality
//! gate is a regular `ValidationResult` with error-severity violations.

use std::io;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum VigilError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid TOML in {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid YAML in {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("history query failed: {0}")]
    History(String),
    #[error("history query timed out after {0:?}")]
    HistoryTimeout(Duration),
    #[error("file exceeds {limit} bytes: {path}")]
    TooLarge { path: PathBuf, limit: u64 },
    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
    #[error("validation subprocess failed: {0}")]
    Subprocess(String),
}

impl VigilError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        VigilError::Io {
            path: path.into(),
            source,
        }
    }
}
