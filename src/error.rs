//! Error types for narrow.

use thiserror::Error;

/// Top-level error type.
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] hyper::Error),

    #[error("invalid upstream URI: {0}")]
    Uri(#[from] hyper::http::uri::InvalidUri),

    #[error("monitoring upload failed: {0}")]
    Upload(#[from] reqwest::Error),

    #[error("invalid hook manifest: {0}")]
    Manifest(String),
}
