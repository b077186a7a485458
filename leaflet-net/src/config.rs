//! Connection configuration.

use std::time::Duration;

/// Default full-node wallet port.
pub const DEFAULT_PORT: u16 = 18444;

/// Default network id.
pub const DEFAULT_NETWORK_ID: &str = "mainnet";

/// Default handshake timeout.
pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// Protocol version advertised in the handshake.
pub const PROTOCOL_VERSION: &str = "0.0.34";

/// Software version advertised in the handshake.
pub const SOFTWARE_VERSION: &str = "leaflet/0.1.0";

/// Configuration for a connection to a full node.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Host name or address of the node.
    pub host: String,

    /// Wallet protocol port of the node.
    pub port: u16,

    /// API key sent as a request header when connecting.
    pub api_key: String,

    /// Network the node is expected to be on.
    pub network_id: String,

    /// Whether to connect over TLS (`wss`). Disabled only in tests.
    pub use_tls: bool,

    /// Timeout for completing the protocol handshake.
    pub handshake_timeout: Duration,
}

impl ConnectionConfig {
    /// Create a configuration for the given host and API key, with defaults
    /// for everything else.
    pub fn new(host: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_PORT,
            api_key: api_key.into(),
            network_id: DEFAULT_NETWORK_ID.to_string(),
            use_tls: true,
            handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
        }
    }

    /// Set the port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the network id.
    pub fn with_network_id(mut self, network_id: impl Into<String>) -> Self {
        self.network_id = network_id.into();
        self
    }

    /// Enable or disable TLS.
    pub fn with_tls(mut self, use_tls: bool) -> Self {
        self.use_tls = use_tls;
        self
    }

    /// Set the handshake timeout.
    pub fn with_handshake_timeout(mut self, timeout: Duration) -> Self {
        self.handshake_timeout = timeout;
        self
    }

    /// WebSocket URL of the node's wallet endpoint.
    pub fn ws_url(&self) -> String {
        let scheme = if self.use_tls { "wss" } else { "ws" };
        format!("{}://{}:{}/ws", scheme, self.host, self.port)
    }
}
