//! The channel contract between the transport and the correlation engine.

use async_trait::async_trait;
use tokio::sync::mpsc;

use leaflet_core::Message;

use crate::error::NetResult;

/// A full-duplex framed channel to a full node.
///
/// Guarantees:
/// - Frames are delivered to the sink whole and in arrival order; partial
///   frames are never surfaced.
/// - `open` completes the protocol handshake; a channel that opened
///   successfully speaks the configured network.
/// - `close` is idempotent. After close the sink receives nothing further
///   and `send` fails. Dropping the sink sender is the channel's
///   closed-connection signal: when the sink's receiving half sees the
///   stream end, the connection is gone.
#[async_trait]
pub trait MessageChannel: Send + Sync {
    /// Register the single inbound sink. Must be called before `open`.
    fn set_sink(&mut self, sink: mpsc::UnboundedSender<Message>);

    /// Establish the transport and complete the protocol handshake.
    async fn open(&mut self) -> NetResult<()>;

    /// Send one frame. Never blocks indefinitely; fails fast once the
    /// channel is closed.
    async fn send(&self, message: Message) -> NetResult<()>;

    /// Shut the channel down. Idempotent.
    async fn close(&self);
}
