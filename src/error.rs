//! Error types for credential handling and certificate verification.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ApiSetuError>;

#[derive(Debug, Error)]
pub enum ApiSetuError {
    /// Credentials are missing. Detected locally, never reaches the network.
    #[error("{0}")]
    Configuration(String),

    /// Caller input rejected before any request is built.
    #[error("{0}")]
    Validation(String),

    /// The remote API answered with a non-2xx status.
    #[error("{message}")]
    Request { status: u16, message: String },

    /// No HTTP response was received (DNS, refused connection, timeout).
    #[error("Request failed: {0}")]
    Transport(String),

    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid settings file: {0}")]
    TomlRead(#[from] toml::de::Error),

    #[error("Could not serialize settings: {0}")]
    TomlWrite(#[from] toml::ser::Error),
}

impl ApiSetuError {
    /// HTTP status of a remote rejection, if this is one.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Request { status, .. } => Some(*status),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }
}
