use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    // Startup
    #[error("Missing credential: {0}")]
    MissingCredential(&'static str),

    #[error("Cannot read config file {path}: {source}")]
    ConfigFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot parse config file {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    // Upstream feed
    #[error("Request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Request to {url} returned HTTP {status}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
    },

    // Store
    #[error("Database error: {0}")]
    Database(#[from] tokio_rusqlite::Error),

    #[error("libSQL request failed: {0}")]
    Remote(String),

    // Per-article data
    #[error("Article is missing field `{0}`")]
    MissingField(&'static str),
}

pub type Result<T> = std::result::Result<T, AppError>;
