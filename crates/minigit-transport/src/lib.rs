//! Smart HTTP transport for minigit network operations.
//!
//! This crate provides the physical transport layer: URL parsing and the two
//! HTTP round-trips of the smart protocol (refs discovery GET, upload-pack
//! POST). Protocol framing lives in `minigit-protocol`.

pub mod http;
pub mod url;

pub use url::GitUrl;

/// Errors that can occur during transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("unsupported URL scheme: {0}")]
    UnsupportedScheme(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    #[error("HTTP error: {status}: {message}")]
    Http { status: u16, message: String },
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        TransportError::ConnectionFailed(e.to_string())
    }
}
