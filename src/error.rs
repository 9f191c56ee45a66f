//! Error handling for courier

use thiserror::Error;

use crate::hooks::HookPoint;

/// Boxed error type accepted from hook callbacks and transports.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Main error type for courier operations
#[derive(Error, Debug)]
pub enum CourierError {
    #[error("a URL is required to make a request")]
    UrlRequired,

    #[error("no URL scheme supplied: {0}")]
    MissingSchema(String),

    #[error("unsupported URL scheme: {0}")]
    InvalidSchema(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("{point} hook failed: {source}")]
    Hook {
        point: HookPoint,
        #[source]
        source: BoxError,
    },

    #[error("connection error: {0}")]
    Connection(String),

    #[error("proxy error: {0}")]
    Proxy(String),

    #[error("SSL/TLS error: {0}")]
    Ssl(String),

    #[error("network timeout: {0}")]
    Timeout(String),

    #[error("invalid chunked encoding: {0}")]
    ChunkedEncoding(String),

    #[error("failed to decode response content: {0}")]
    ContentDecoding(String),

    #[error("redirect limit exceeded: {0}")]
    TooManyRedirects(usize),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CourierError {
    /// True for errors surfaced from the transport layer rather than
    /// produced during request construction.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            CourierError::Connection(_)
                | CourierError::Proxy(_)
                | CourierError::Ssl(_)
                | CourierError::Timeout(_)
                | CourierError::ChunkedEncoding(_)
                | CourierError::ContentDecoding(_)
                | CourierError::TooManyRedirects(_)
        )
    }
}

/// Result type alias for courier operations
pub type Result<T> = std::result::Result<T, CourierError>;
