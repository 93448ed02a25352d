//! Error types for the posture-pulse library.

use thiserror::Error;

/// Errors raised by the library side of posture-pulse.
///
/// The binary and the TUI glue wrap these in `anyhow::Error`.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration could not be loaded or failed validation.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// A threshold outside the accepted range was supplied.
    #[error("Threshold {0} is outside the range [5, 60]")]
    InvalidThreshold(f64),

    /// Decimation factor or buffer capacity was zero.
    #[error("Invalid retention policy: {0}")]
    InvalidRetention(String),

    /// An inbound sensor payload could not be decoded.
    #[error("Malformed sensor payload: {0}")]
    Payload(String),

    /// The MQTT client rejected a request.
    #[error("MQTT client error: {0}")]
    Mqtt(String),

    /// HTTP request to the history store failed.
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// The history store answered with a non-success status.
    #[error("History store returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// Connection to a remote endpoint failed.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// Timeout waiting for a response.
    #[error("Request timed out")]
    Timeout,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Error::Timeout
        } else if err.is_connect() {
            Error::Connection(err.to_string())
        } else {
            Error::Http(err.to_string())
        }
    }
}

impl From<rumqttc::ClientError> for Error {
    fn from(err: rumqttc::ClientError) -> Self {
        Error::Mqtt(err.to_string())
    }
}

impl From<config::ConfigError> for Error {
    fn from(err: config::ConfigError) -> Self {
        Error::Config(err.to_string())
    }
}

/// Convenience alias used across the library.
pub type Result<T, E = Error> = std::result::Result<T, E>;
