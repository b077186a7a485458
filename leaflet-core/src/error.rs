//! Error types for the leaflet-core crate.

use std::fmt;

/// Top-level error type for leaflet-core operations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CoreError {
    /// Payload serialization or deserialization failed.
    Codec(CodecError),
    /// Frame encoding or decoding failed.
    Frame(FrameError),
    /// Address encoding or decoding failed.
    Address(AddressError),
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoreError::Codec(e) => write!(f, "codec error: {}", e),
            CoreError::Frame(e) => write!(f, "frame error: {}", e),
            CoreError::Address(e) => write!(f, "address error: {}", e),
        }
    }
}

impl std::error::Error for CoreError {}

impl From<CodecError> for CoreError {
    fn from(e: CodecError) -> Self {
        CoreError::Codec(e)
    }
}

impl From<FrameError> for CoreError {
    fn from(e: FrameError) -> Self {
        CoreError::Frame(e)
    }
}

impl From<AddressError> for CoreError {
    fn from(e: AddressError) -> Self {
        CoreError::Address(e)
    }
}

/// Errors related to payload serialization and deserialization.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CodecError {
    /// Failed to encode a payload to bytes.
    EncodeFailed(String),
    /// Failed to decode a payload from bytes.
    DecodeFailed(String),
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodecError::EncodeFailed(msg) => write!(f, "encode failed: {}", msg),
            CodecError::DecodeFailed(msg) => write!(f, "decode failed: {}", msg),
        }
    }
}

impl std::error::Error for CodecError {}

/// Errors related to the binary frame codec.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FrameError {
    /// The input ended before a complete frame could be read.
    Truncated,
    /// The frame declares a payload larger than the allowed maximum.
    TooLarge {
        /// Declared payload size in bytes.
        size: usize,
        /// Maximum allowed payload size in bytes.
        max: usize,
    },
    /// The frame carries a message type code outside the protocol enumeration.
    UnknownType(u8),
    /// Extra bytes remained after the declared payload.
    TrailingBytes(usize),
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameError::Truncated => write!(f, "truncated frame"),
            FrameError::TooLarge { size, max } => {
                write!(f, "frame too large: {} bytes (max: {})", size, max)
            }
            FrameError::UnknownType(code) => write!(f, "unknown message type: {}", code),
            FrameError::TrailingBytes(count) => {
                write!(f, "{} trailing bytes after frame", count)
            }
        }
    }
}

impl std::error::Error for FrameError {}

/// Errors related to bech32m address handling.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AddressError {
    /// The string is not valid bech32.
    InvalidEncoding(String),
    /// The address uses the bech32 variant instead of bech32m.
    NotBech32m,
    /// The human-readable prefix does not match the expected one.
    WrongPrefix {
        /// Prefix the caller expected.
        expected: String,
        /// Prefix found in the address.
        actual: String,
    },
    /// The decoded payload is not exactly 32 bytes.
    WrongLength(usize),
}

impl fmt::Display for AddressError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddressError::InvalidEncoding(msg) => write!(f, "invalid bech32 encoding: {}", msg),
            AddressError::NotBech32m => write!(f, "address is not bech32m"),
            AddressError::WrongPrefix { expected, actual } => {
                write!(f, "wrong address prefix: expected {}, got {}", expected, actual)
            }
            AddressError::WrongLength(len) => {
                write!(f, "decoded address is {} bytes, expected 32", len)
            }
        }
    }
}

impl std::error::Error for AddressError {}
