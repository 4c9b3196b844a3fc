use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DeckError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Response cache {path} is corrupt: {source}")]
    CacheCorrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Invalid request URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("Lookup failed: {0}")]
    Lookup(String),
    #[error("Download failed for {url}: HTTP {status}")]
    Download { url: String, status: u16 },
}

pub type Result<T> = std::result::Result<T, DeckError>;
