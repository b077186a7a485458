//! Payload codec for protocol frames.
//!
//! The `data` field of every frame is the bincode encoding of one
//! `wallet_protocol` struct. Correlation happens by decoding inbound
//! payloads and comparing echoed request fields, so the codec is pinned to
//! one deterministic layout: fixed-width little-endian integers, and no
//! trailing bytes tolerated on decode. A payload that decodes is exactly
//! the struct that was encoded, nothing more.

use bincode::Options;
use serde::{de::DeserializeOwned, Serialize};

use crate::error::CodecError;

/// Serialize a payload to frame bytes.
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, CodecError> {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .with_little_endian()
        .serialize(value)
        .map_err(|e| CodecError::EncodeFailed(e.to_string()))
}

/// Deserialize a payload from frame bytes.
///
/// Fails on malformed input, on a payload of the wrong shape, and on
/// trailing bytes after the value.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, CodecError> {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .with_little_endian()
        .reject_trailing_bytes()
        .deserialize(bytes)
        .map_err(|e| CodecError::DecodeFailed(e.to_string()))
}
