//! # Leaflet Core
//!
//! Core types, codecs and hashing for the Leaflet wallet-protocol adapter.
//!
//! This crate provides the foundation for the transport and provider crates:
//! - Wallet protocol data types (coins, coin states, header blocks)
//! - The framed protocol message and its binary frame codec
//! - Deterministic binary serialization for message payloads
//! - Coin-id hashing (SHA-256 over the canonical coin encoding)
//! - Bech32m address encoding and hex hash validation

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod address;
pub mod codec;
pub mod error;
pub mod hashing;
pub mod message;
pub mod types;
pub mod wallet_protocol;

// Re-export commonly used types at crate root
pub use error::{AddressError, CodecError, CoreError, FrameError};
pub use message::{Message, ProtocolMessageType, MAX_FRAME_SIZE};
pub use types::{Bytes32, Coin, CoinState, HeaderBlock, RewardChainBlock};
