use std::path::PathBuf;

use thiserror::Error;

/// Errors from one disruption fetch cycle. All variants surface to the user
/// as the same generic banner; the detail goes to the log.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("no API key configured (set GEMINI_API_KEY or api_key in the config file)")]
    MissingApiKey,

    #[error("HTTP error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("backend returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("failed to parse data from AI model: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("fetch task ended without a result")]
    TaskLost(#[from] flume::RecvError),
}

/// Failure to load the base map layer. Logged and swallowed by the map view.
#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("failed to download geometry: {0}")]
    Network(#[from] reqwest::Error),

    #[error("invalid geometry document: {0}")]
    Parse(#[from] geojson::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config file {path}: {source}")]
    Toml {
        path: PathBuf,
        source: toml::de::Error,
    },
}
