//! Transport error types.

use std::io;
use thiserror::Error;

/// Transport-specific errors.
#[derive(Debug, Error)]
pub enum NetError {
    /// I/O error during network operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// WebSocket protocol or connection error.
    #[error("WebSocket error: {0}")]
    WebSocket(String),

    /// A frame could not be encoded or decoded.
    #[error("Frame error: {0}")]
    Frame(#[from] leaflet_core::FrameError),

    /// A handshake payload could not be encoded or decoded.
    #[error("Codec error: {0}")]
    Codec(#[from] leaflet_core::CodecError),

    /// The peer rejected or broke the protocol handshake.
    #[error("Handshake failed: {0}")]
    HandshakeFailed(String),

    /// The peer did not complete the handshake in time.
    #[error("Handshake timeout")]
    HandshakeTimeout,

    /// The peer is on a different network.
    #[error("Network id mismatch: expected {expected}, got {actual}")]
    NetworkIdMismatch {
        /// Network id this channel was configured for.
        expected: String,
        /// Network id the peer reported.
        actual: String,
    },

    /// No inbound sink was registered before `open`.
    #[error("No inbound sink registered")]
    MissingSink,

    /// The channel is not open (never opened, or closed).
    #[error("Channel is not open")]
    NotOpen,
}

/// Result type for transport operations.
pub type NetResult<T> = Result<T, NetError>;
