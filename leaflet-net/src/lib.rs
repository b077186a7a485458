//! Transport layer for the Leaflet wallet-protocol adapter.
//!
//! This crate provides:
//! - The [`MessageChannel`] contract: a full-duplex channel that delivers
//!   whole frames, in arrival order, to a single registered sink
//! - A WebSocket implementation ([`WsChannel`]) that connects to a full node
//!   over TLS, authenticates with an API key header, and completes the
//!   wallet protocol handshake as part of `open`
//! - Connection configuration
//!
//! The correlation engine in `leaflet-provider` is written against the
//! [`MessageChannel`] trait only, which keeps the transport swappable (the
//! test suites drive it with an in-memory channel).

#![deny(unsafe_code)]

pub mod channel;
pub mod config;
pub mod error;
pub mod ws;

pub use channel::MessageChannel;
pub use config::{ConnectionConfig, DEFAULT_NETWORK_ID, DEFAULT_PORT};
pub use error::{NetError, NetResult};
pub use ws::WsChannel;
