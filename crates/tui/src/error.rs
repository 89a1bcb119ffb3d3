use std::path::PathBuf;
use thiserror::Error;
use xray_core::AdapterError;

/// The main error type for the monitor
#[derive(Debug, Error)]
pub enum TuiError {
    /// Terminal I/O errors
    #[error("Terminal error: {0}")]
    Terminal(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A chain client could not be constructed
    #[error("Failed to set up {name}: {source}")]
    Monitor {
        name: String,
        #[source]
        source: AdapterError,
    },

    #[error("Logging setup failed: {0}")]
    Logging(String),
}

/// Errors loading or validating the configuration file
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid endpoint '{url}': {reason}")]
    InvalidEndpoint { url: String, reason: String },

    #[error("invalid endpoint argument '{0}', expected <cosmos|eth|eth_sub>=<url>")]
    InvalidEndpointArg(String),

    #[error("{field} must be at least 1")]
    Zero { field: &'static str },
}

/// Result type alias using our custom error
pub type TuiResult<T> = Result<T, TuiError>;
