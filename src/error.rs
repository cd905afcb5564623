use std::path::PathBuf;
use thiserror::Error;

/// Error returned when a `YEAR-MONTH` period key cannot be parsed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid release period '{0}', expected YEAR-MONTH with MONTH in 1, 4, 7 or 10")]
pub struct ParsePeriodError(pub String);

/// Errors that can occur when fetching or parsing a remote listing
#[derive(Error, Debug)]
pub enum ListingError {
    #[error("Request to {url} failed: {source}")]
    RequestFailed {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP error {status} for {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("Malformed listing JSON from {url}: {source}")]
    InvalidJson {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Malformed release feed from {url}: {source}")]
    InvalidFeed {
        url: String,
        #[source]
        source: rss::Error,
    },
}

/// Errors that can occur while writing a stream descriptor
#[derive(Error, Debug)]
pub enum DescriptorError {
    #[error("Failed to create directory {path}: {source}")]
    CreateDirectoryFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write descriptor {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors that can occur when loading or saving the persisted state document
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("State file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read state file {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write state file {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse state JSON in {path}: {source}")]
    JsonParseFailed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to serialize state: {0}")]
    JsonSerializeFailed(#[from] serde_json::Error),
}

/// Errors in the operator-supplied configuration
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("No storage root configured for .strm files")]
    MissingStorageRoot,

    #[error("Invalid endpoint URL '{url}': {reason}")]
    InvalidEndpoint { url: String, reason: String },
}

/// Top-level errors for sync operations
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("State store error: {0}")]
    Store(#[from] StoreError),
}
