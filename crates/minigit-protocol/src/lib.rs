//! The minigit wire protocol: Smart HTTP v1 clone.
//!
//! This crate implements the client side of the `git-upload-pack` exchange:
//! pkt-line framing, parsing the `/info/refs` advertisement, and sending the
//! want/done request that yields the packfile.

pub mod fetch;
pub mod pktline;
pub mod refs;

use minigit_transport::TransportError;

/// Errors that can occur during protocol operations.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("invalid pkt-line: {0}")]
    InvalidPktLine(String),

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
