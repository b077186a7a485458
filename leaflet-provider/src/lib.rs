//! # Leaflet Provider
//!
//! Message correlation engine and wallet query facade for a Chia-style
//! light client backed by a remote full node.
//!
//! A single connection multiplexes many in-flight requests and long-lived
//! subscriptions. Responses carry no request id, so demultiplexing is done
//! by typed predicate matching against message contents: each call site
//! installs a [`Filter`] that captures its request fields by value, and the
//! [`MessageManager`] offers every inbound frame to the installed filters in
//! insertion order.
//!
//! # Usage
//!
//! ```ignore
//! use leaflet_net::ConnectionConfig;
//! use leaflet_provider::{BalanceRequest, LeafletProvider};
//!
//! let config = ConnectionConfig::new("leaflet.example", "api-key");
//! let provider = LeafletProvider::new(config);
//! provider.initialize().await?;
//!
//! let balance = provider
//!     .balance(&BalanceRequest {
//!         puzzle_hash: Some("0x...".to_string()),
//!         ..Default::default()
//!     })
//!     .await?;
//!
//! provider.close().await;
//! ```

#![deny(unsafe_code)]

pub mod error;
pub mod filter;
pub mod manager;
pub mod provider;
pub mod types;

// Re-export main types
pub use error::{ProviderError, ProviderResult};
pub use filter::{Completion, Filter, FilterId, DEFAULT_RESPONSE_WAIT};
pub use manager::{MessageManager, SubscriptionHandle};
pub use provider::{BalanceRequest, LeafletProvider, Subscription};
pub use types::{BlockHeader, Coin, CoinState, PuzzleSolution};
