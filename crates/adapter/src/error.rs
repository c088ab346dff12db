//! Error types for the adapter binary and library.

use restmcp_http_tools::runtime::HttpToolsError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AdapterError {
    /// Invalid or missing configuration (bad JSON/YAML, missing fields)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Tool catalog or outbound client failures
    #[error(transparent)]
    Tools(#[from] HttpToolsError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Result type alias for adapter operations.
pub type Result<T> = std::result::Result<T, AdapterError>;
