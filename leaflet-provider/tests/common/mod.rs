//! Shared test helpers: an in-memory transport and frame builders.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;

use leaflet_core::codec;
use leaflet_core::types::{Coin, CoinState};
use leaflet_core::{Message, ProtocolMessageType};
use leaflet_net::{ConnectionConfig, MessageChannel, NetError, NetResult};
use leaflet_provider::LeafletProvider;

/// Scriptable in-memory transport shared between a test and its channel.
#[derive(Default)]
pub struct MockTransport {
    sink: Mutex<Option<mpsc::UnboundedSender<Message>>>,
    sent: Mutex<Vec<Message>>,
    fail_open: AtomicBool,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Build the channel half handed to the provider.
    pub fn channel(self: &Arc<Self>) -> Box<dyn MessageChannel> {
        Box::new(MockChannel {
            transport: self.clone(),
        })
    }

    /// Make the next `open` fail.
    pub fn fail_open(&self) {
        self.fail_open.store(true, Ordering::SeqCst);
    }

    /// Deliver an inbound frame to the provider.
    pub fn inject(&self, message: Message) {
        let sink = self
            .sink
            .lock()
            .unwrap()
            .clone()
            .expect("channel not opened");
        sink.send(message).expect("dispatch task gone");
    }

    /// Frames the provider sent so far.
    pub fn sent(&self) -> Vec<Message> {
        self.sent.lock().unwrap().clone()
    }

    /// Simulate the connection dying.
    pub fn disconnect(&self) {
        self.sink.lock().unwrap().take();
    }
}

struct MockChannel {
    transport: Arc<MockTransport>,
}

#[async_trait]
impl MessageChannel for MockChannel {
    fn set_sink(&mut self, sink: mpsc::UnboundedSender<Message>) {
        *self.transport.sink.lock().unwrap() = Some(sink);
    }

    async fn open(&mut self) -> NetResult<()> {
        if self.transport.fail_open.load(Ordering::SeqCst) {
            return Err(NetError::HandshakeFailed("scripted failure".to_string()));
        }
        Ok(())
    }

    async fn send(&self, message: Message) -> NetResult<()> {
        self.transport.sent.lock().unwrap().push(message);
        Ok(())
    }

    async fn close(&self) {
        self.transport.sink.lock().unwrap().take();
    }
}

/// Provider wired to a fresh mock transport, with a short response deadline
/// so timeout tests run fast.
pub async fn connected_provider() -> (Arc<LeafletProvider>, Arc<MockTransport>) {
    let transport = MockTransport::new();
    let config = ConnectionConfig::new("127.0.0.1", "test-key").with_network_id("testnet0");
    let provider = Arc::new(
        LeafletProvider::with_channel(config, transport.channel())
            .with_response_wait(Duration::from_millis(250)),
    );
    provider.initialize().await.expect("initialize");
    (provider, transport)
}

/// Encode a payload into a protocol frame.
pub fn frame<T: serde::Serialize>(msg_type: ProtocolMessageType, payload: &T) -> Message {
    Message::new(msg_type, codec::encode(payload).unwrap())
}

/// A coin with a deterministic parent.
pub fn coin(puzzle_hash: [u8; 32], amount: u64) -> Coin {
    Coin {
        parent_coin_info: [0xAAu8; 32],
        puzzle_hash,
        amount,
    }
}

/// An unspent coin state.
pub fn unspent(puzzle_hash: [u8; 32], amount: u64) -> CoinState {
    CoinState {
        coin: coin(puzzle_hash, amount),
        spent_height: None,
        created_height: Some(1),
    }
}

/// Wait until the provider has sent `count` frames.
pub async fn wait_for_sent(transport: &MockTransport, count: usize) {
    for _ in 0..100 {
        if transport.sent().len() >= count {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("provider never sent frame #{}", count);
}
