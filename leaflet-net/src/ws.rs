//! WebSocket channel to a full node.
//!
//! The channel connects over TLS, authenticates with the API key header,
//! completes the wallet protocol handshake inside `open`, and then runs a
//! read task and a write task for the lifetime of the connection. Inbound
//! binary frames are decoded and forwarded to the registered sink; the sink
//! sender is dropped when the connection dies, which is the closed signal
//! for the correlation engine downstream.

use async_trait::async_trait;
use futures_util::stream::SplitStream;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, Mutex};
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::protocol::Message as WsMessage;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use leaflet_core::codec;
use leaflet_core::wallet_protocol::{Handshake, NODE_TYPE_WALLET};
use leaflet_core::{Message, ProtocolMessageType};

use crate::channel::MessageChannel;
use crate::config::{ConnectionConfig, PROTOCOL_VERSION, SOFTWARE_VERSION};
use crate::error::{NetError, NetResult};

/// Request header carrying the API key.
const API_KEY_HEADER: &str = "x-api-key";

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// WebSocket implementation of [`MessageChannel`].
pub struct WsChannel {
    config: ConnectionConfig,
    sink: Option<mpsc::UnboundedSender<Message>>,
    writer_tx: Mutex<Option<mpsc::UnboundedSender<WsMessage>>>,
    shutdown_tx: Mutex<Option<mpsc::Sender<()>>>,
}

impl WsChannel {
    /// Create a channel for the given connection configuration.
    pub fn new(config: ConnectionConfig) -> Self {
        Self {
            config,
            sink: None,
            writer_tx: Mutex::new(None),
            shutdown_tx: Mutex::new(None),
        }
    }

    /// Build our side of the wallet protocol handshake.
    fn our_handshake(&self) -> Handshake {
        Handshake {
            network_id: self.config.network_id.clone(),
            protocol_version: PROTOCOL_VERSION.to_string(),
            software_version: SOFTWARE_VERSION.to_string(),
            server_port: 0,
            node_type: NODE_TYPE_WALLET,
            capabilities: vec![(1, "1".to_string())],
        }
    }

    /// Read frames until the peer's handshake arrives.
    ///
    /// Non-handshake protocol frames before the handshake are a protocol
    /// violation and fail the open.
    async fn await_handshake(read: &mut SplitStream<WsStream>) -> NetResult<Handshake> {
        while let Some(incoming) = read.next().await {
            let ws_msg = incoming.map_err(|e| NetError::WebSocket(e.to_string()))?;
            match ws_msg {
                WsMessage::Binary(data) => {
                    let frame = Message::from_bytes(&data)?;
                    if frame.msg_type != ProtocolMessageType::Handshake {
                        return Err(NetError::HandshakeFailed(format!(
                            "expected handshake, got {}",
                            frame.msg_type
                        )));
                    }
                    return Ok(codec::decode::<Handshake>(&frame.data)?);
                }
                WsMessage::Ping(_) | WsMessage::Pong(_) => continue,
                WsMessage::Close(_) => break,
                _ => continue,
            }
        }
        Err(NetError::HandshakeFailed(
            "connection closed during handshake".to_string(),
        ))
    }
}

#[async_trait]
impl MessageChannel for WsChannel {
    fn set_sink(&mut self, sink: mpsc::UnboundedSender<Message>) {
        self.sink = Some(sink);
    }

    async fn open(&mut self) -> NetResult<()> {
        let sink = self.sink.clone().ok_or(NetError::MissingSink)?;

        let mut request = self
            .config
            .ws_url()
            .into_client_request()
            .map_err(|e| NetError::WebSocket(e.to_string()))?;
        let api_key = HeaderValue::from_str(&self.config.api_key)
            .map_err(|e| NetError::WebSocket(e.to_string()))?;
        request.headers_mut().insert(API_KEY_HEADER, api_key);

        let (stream, _) = connect_async(request)
            .await
            .map_err(|e| NetError::WebSocket(e.to_string()))?;
        let (mut write, mut read) = stream.split();

        // We speak first, then verify the node's reply.
        let frame = Message::new(
            ProtocolMessageType::Handshake,
            codec::encode(&self.our_handshake())?,
        );
        write
            .send(WsMessage::Binary(frame.to_bytes()))
            .await
            .map_err(|e| NetError::WebSocket(e.to_string()))?;

        let theirs = tokio::time::timeout(
            self.config.handshake_timeout,
            Self::await_handshake(&mut read),
        )
        .await
        .map_err(|_| NetError::HandshakeTimeout)??;

        if theirs.network_id != self.config.network_id {
            return Err(NetError::NetworkIdMismatch {
                expected: self.config.network_id.clone(),
                actual: theirs.network_id,
            });
        }
        tracing::debug!(
            network = %theirs.network_id,
            node_version = %theirs.software_version,
            "Handshake complete"
        );

        // Write task: serializes all outbound traffic onto the socket.
        let (writer_tx, mut writer_rx) = mpsc::unbounded_channel::<WsMessage>();
        tokio::spawn(async move {
            while let Some(msg) = writer_rx.recv().await {
                let is_close = matches!(msg, WsMessage::Close(_));
                if write.send(msg).await.is_err() || is_close {
                    return;
                }
            }
            // Sender side dropped without an explicit close frame.
            let _ = write.send(WsMessage::Close(None)).await;
        });

        // Read task: forwards decoded frames to the sink until shutdown or
        // the connection dies. Dropping the sink is the closed signal.
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);
        let pong_tx = writer_tx.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => break,
                    incoming = read.next() => match incoming {
                        Some(Ok(WsMessage::Binary(data))) => match Message::from_bytes(&data) {
                            Ok(frame) => {
                                tracing::trace!(msg_type = %frame.msg_type, "Received frame");
                                if sink.send(frame).is_err() {
                                    break;
                                }
                            }
                            Err(e) => {
                                tracing::warn!(error = %e, "Dropping undecodable frame");
                            }
                        },
                        Some(Ok(WsMessage::Ping(payload))) => {
                            let _ = pong_tx.send(WsMessage::Pong(payload));
                        }
                        Some(Ok(WsMessage::Close(_))) | None => {
                            tracing::debug!("Connection closed by peer");
                            break;
                        }
                        Some(Ok(_)) => {
                            // Text frames are not part of the protocol.
                        }
                        Some(Err(e)) => {
                            tracing::debug!(error = %e, "WebSocket read error");
                            break;
                        }
                    },
                }
            }
        });

        *self.writer_tx.lock().await = Some(writer_tx);
        *self.shutdown_tx.lock().await = Some(shutdown_tx);

        Ok(())
    }

    async fn send(&self, message: Message) -> NetResult<()> {
        let guard = self.writer_tx.lock().await;
        let tx = guard.as_ref().ok_or(NetError::NotOpen)?;
        tx.send(WsMessage::Binary(message.to_bytes()))
            .map_err(|_| NetError::NotOpen)
    }

    async fn close(&self) {
        if let Some(shutdown) = self.shutdown_tx.lock().await.take() {
            let _ = shutdown.send(()).await;
        }
        if let Some(writer) = self.writer_tx.lock().await.take() {
            let _ = writer.send(WsMessage::Close(None));
        }
    }
}
