//! Provider error types.

use thiserror::Error;

use leaflet_net::NetError;

/// Errors surfaced by provider operations.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// A hex hash or bech32m address failed validation.
    ///
    /// Balance, subscription, removals and additions calls coerce this case
    /// to a `None` result instead; the remaining query operations raise it.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Operation attempted before `initialize` or after `close`.
    #[error("not connected to a node")]
    NotConnected,

    /// Handshake or I/O failure in the underlying channel.
    #[error("transport error: {0}")]
    Transport(#[from] NetError),

    /// No matching response arrived within the filter's deadline.
    #[error("request timed out")]
    Timeout,

    /// The connection was closed while the operation was pending.
    #[error("operation cancelled: connection closed")]
    Cancelled,

    /// The operation is not supported by this provider, which holds no keys.
    #[error("unsupported operation: {0}")]
    UnsupportedOperation(&'static str),

    /// A response frame matched but its payload could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),
}

impl From<leaflet_core::CodecError> for ProviderError {
    fn from(e: leaflet_core::CodecError) -> Self {
        ProviderError::Decode(e.to_string())
    }
}

/// Result type for provider operations.
pub type ProviderResult<T> = Result<T, ProviderError>;
