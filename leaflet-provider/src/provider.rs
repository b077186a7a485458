//! Wallet query facade.
//!
//! Every query builds a protocol request, installs a filter whose predicate
//! matches the expected response by contents, awaits the completion and
//! translates the payload into the public data model. "Not found" answers
//! from the node (reject messages) translate to `None`, not errors.

use std::time::Duration;

use serde::de::DeserializeOwned;
use tokio::sync::mpsc;

use leaflet_core::address::{self, DEFAULT_ADDRESS_PREFIX};
use leaflet_core::codec;
use leaflet_core::wallet_protocol::{
    RegisterForCoinUpdates, RegisterForPhUpdates, RejectAdditionsRequest, RejectHeaderBlocks,
    RejectHeaderRequest, RejectPuzzleSolution, RejectRemovalsRequest, RequestAdditions,
    RequestBlockHeader, RequestChildren, RequestHeaderBlocks, RequestPuzzleSolution,
    RequestRemovals, RespondAdditions, RespondBlockHeader, RespondChildren, RespondHeaderBlocks,
    RespondPuzzleSolution, RespondRemovals, RespondToCoinUpdates, RespondToPhUpdates,
};
use leaflet_core::{Bytes32, Message, ProtocolMessageType};

use leaflet_net::{ConnectionConfig, MessageChannel, WsChannel};

use crate::error::{ProviderError, ProviderResult};
use crate::filter::{Filter, DEFAULT_RESPONSE_WAIT};
use crate::manager::{MessageManager, SubscriptionHandle};
use crate::types::{BlockHeader, Coin, CoinState, PuzzleSolution};

/// Parameters of a balance query.
#[derive(Debug, Clone, Default)]
pub struct BalanceRequest {
    /// Bech32m address. Takes precedence over `puzzle_hash` when it carries
    /// the configured prefix.
    pub address: Option<String>,
    /// Hex-encoded puzzle hash, with or without `0x`.
    pub puzzle_hash: Option<String>,
    /// Do not consider coin states final below this height.
    pub min_height: u64,
}

/// A live coin-state subscription.
///
/// Updates arrive in inbound-frame order. Dropping the subscription stops
/// delivery but leaves the filter installed; call [`Subscription::unsubscribe`]
/// to remove it.
pub struct Subscription {
    updates: mpsc::UnboundedReceiver<Vec<CoinState>>,
    handle: SubscriptionHandle,
}

impl Subscription {
    /// Receive the next batch of coin states, or `None` once the
    /// connection is gone.
    pub async fn recv(&mut self) -> Option<Vec<CoinState>> {
        self.updates.recv().await
    }

    /// Remove the subscription filter from the registry.
    pub async fn unsubscribe(self) {
        self.handle.unsubscribe().await;
    }
}

/// Light-client provider backed by a remote full node.
///
/// The provider holds no keys: signing, transfers and offers are
/// unsupported operations by contract.
pub struct LeafletProvider {
    config: ConnectionConfig,
    address_prefix: String,
    response_wait: Duration,
    manager: MessageManager,
}

impl LeafletProvider {
    /// Create a provider over a WebSocket channel for `config`.
    pub fn new(config: ConnectionConfig) -> Self {
        let channel = WsChannel::new(config.clone());
        Self::with_channel(config, Box::new(channel))
    }

    /// Create a provider over a caller-supplied channel.
    pub fn with_channel(config: ConnectionConfig, channel: Box<dyn MessageChannel>) -> Self {
        Self {
            config,
            address_prefix: DEFAULT_ADDRESS_PREFIX.to_string(),
            response_wait: DEFAULT_RESPONSE_WAIT,
            manager: MessageManager::new(channel),
        }
    }

    /// Override the address prefix (mainnet uses `xch`).
    pub fn with_address_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.address_prefix = prefix.into();
        self
    }

    /// Override the per-request response deadline.
    pub fn with_response_wait(mut self, wait: Duration) -> Self {
        self.response_wait = wait;
        self
    }

    /// Connect to the node and start the correlation engine.
    pub async fn initialize(&self) -> ProviderResult<()> {
        self.manager.initialize().await
    }

    /// Disconnect. Every pending operation fails with `Cancelled`.
    pub async fn close(&self) {
        self.manager.close().await;
    }

    /// Network this provider is configured for.
    pub fn network_id(&self) -> &str {
        &self.config.network_id
    }

    /// Latest chain-tip height pushed by the node, if one was observed.
    ///
    /// Served from the peak watcher's cache; sends nothing.
    pub fn block_number(&self) -> Option<u64> {
        self.manager.latest_peak_height()
    }

    /// Sum of unspent coin amounts held by an address or puzzle hash.
    ///
    /// Returns `None` when neither input yields a valid 32-byte puzzle hash.
    ///
    /// Note: the query is served by registering interest in the puzzle hash,
    /// so the node will keep pushing updates for it on this connection even
    /// though the call itself is a one-shot read. That is a tradeoff of the
    /// underlying protocol, not an oversight.
    pub async fn balance(&self, request: &BalanceRequest) -> ProviderResult<Option<u128>> {
        let puzzle_hash = match resolve_puzzle_hash(request, &self.address_prefix) {
            Some(hash) => hash,
            None => return Ok(None),
        };

        let payload = RegisterForPhUpdates {
            puzzle_hashes: vec![puzzle_hash],
            min_height: request.min_height,
        };
        let message = Message::new(
            ProtocolMessageType::RegisterInterestInPuzzleHash,
            codec::encode(&payload)?,
        );

        let filter = Filter::request(message, move |msg| {
            if msg.msg_type != ProtocolMessageType::RespondToPhUpdate {
                return false;
            }
            decode_or_log::<RespondToPhUpdates>(msg)
                .is_some_and(|update| update.puzzle_hashes.contains(&puzzle_hash))
        })
        .with_response_wait(self.response_wait);

        let frame = self.manager.register_filter(filter).await?.wait().await?;
        let update: RespondToPhUpdates = codec::decode(&frame.data)?;

        let total = update
            .coin_states
            .iter()
            .filter(|state| state.coin.puzzle_hash == puzzle_hash)
            .filter(|state| state.spent_height.is_none())
            .map(|state| state.coin.amount as u128)
            .sum();
        Ok(Some(total))
    }

    /// Subscribe to coin-state changes for a puzzle hash.
    ///
    /// Returns `None` when the hash is invalid. The node pushes an initial
    /// snapshot followed by updates; each batch is filtered to coins whose
    /// puzzle hash equals the subscribed one.
    pub async fn subscribe_to_puzzle_hash_updates(
        &self,
        puzzle_hash: &str,
        min_height: u64,
    ) -> ProviderResult<Option<Subscription>> {
        let target = match address::validate_hash_hex(puzzle_hash) {
            Some(hash) => hash,
            None => return Ok(None),
        };

        let payload = RegisterForPhUpdates {
            puzzle_hashes: vec![target],
            min_height,
        };
        let message = Message::new(
            ProtocolMessageType::RegisterInterestInPuzzleHash,
            codec::encode(&payload)?,
        );

        let (tx, rx) = mpsc::unbounded_channel();
        let filter = Filter::registered_subscription(message, move |msg| {
            if msg.msg_type != ProtocolMessageType::RespondToPhUpdate {
                return false;
            }
            let Some(update) = decode_or_log::<RespondToPhUpdates>(msg) else {
                return false;
            };
            if !update.puzzle_hashes.contains(&target) {
                return false;
            }
            let relevant: Vec<CoinState> = update
                .coin_states
                .iter()
                .filter(|state| state.coin.puzzle_hash == target)
                .map(CoinState::from)
                .collect();
            let _ = tx.send(relevant);
            true
        });

        let handle = self.manager.subscribe(filter).await?;
        Ok(Some(Subscription {
            updates: rx,
            handle,
        }))
    }

    /// Subscribe to coin-state changes for a specific coin.
    ///
    /// Returns `None` when the coin id is invalid. Each batch is filtered to
    /// states whose computed coin id equals the subscribed one.
    pub async fn subscribe_to_coin_updates(
        &self,
        coin_id: &str,
        min_height: u64,
    ) -> ProviderResult<Option<Subscription>> {
        let target = match address::validate_hash_hex(coin_id) {
            Some(hash) => hash,
            None => return Ok(None),
        };

        let payload = RegisterForCoinUpdates {
            coin_ids: vec![target],
            min_height,
        };
        let message = Message::new(
            ProtocolMessageType::RegisterInterestInCoin,
            codec::encode(&payload)?,
        );

        let (tx, rx) = mpsc::unbounded_channel();
        let filter = Filter::registered_subscription(message, move |msg| {
            if msg.msg_type != ProtocolMessageType::RespondToCoinUpdate {
                return false;
            }
            let Some(update) = decode_or_log::<RespondToCoinUpdates>(msg) else {
                return false;
            };
            if !update.coin_ids.contains(&target) {
                return false;
            }
            let relevant: Vec<CoinState> = update
                .coin_states
                .iter()
                .filter(|state| state.coin.coin_id() == target)
                .map(CoinState::from)
                .collect();
            let _ = tx.send(relevant);
            true
        });

        let handle = self.manager.subscribe(filter).await?;
        Ok(Some(Subscription {
            updates: rx,
            handle,
        }))
    }

    /// Puzzle reveal and solution of a coin spent at `height`.
    ///
    /// `None` when the node rejects the request (coin not spent there).
    pub async fn puzzle_solution(
        &self,
        coin_id: &str,
        height: u64,
    ) -> ProviderResult<Option<PuzzleSolution>> {
        let coin_name = require_hash(coin_id, "coin id")?;

        let payload = RequestPuzzleSolution { coin_name, height };
        let message = Message::new(
            ProtocolMessageType::RequestPuzzleSolution,
            codec::encode(&payload)?,
        );

        let filter = Filter::request(message, move |msg| match msg.msg_type {
            ProtocolMessageType::RespondPuzzleSolution => {
                decode_or_log::<RespondPuzzleSolution>(msg).is_some_and(|r| {
                    r.response.coin_name == coin_name && r.response.height == height
                })
            }
            ProtocolMessageType::RejectPuzzleSolution => {
                decode_or_log::<RejectPuzzleSolution>(msg)
                    .is_some_and(|r| r.coin_name == coin_name && r.height == height)
            }
            _ => false,
        })
        .with_response_wait(self.response_wait);

        let frame = self.manager.register_filter(filter).await?.wait().await?;
        if frame.msg_type == ProtocolMessageType::RejectPuzzleSolution {
            return Ok(None);
        }

        let response: RespondPuzzleSolution = codec::decode(&frame.data)?;
        Ok(Some(PuzzleSolution {
            coin_name: response.response.coin_name,
            height: response.response.height,
            puzzle_reveal: response.response.puzzle,
            solution: response.response.solution,
        }))
    }

    /// Children of a coin. Empty when the coin has none.
    pub async fn coin_children(&self, coin_id: &str) -> ProviderResult<Vec<CoinState>> {
        let coin_name = require_hash(coin_id, "coin id")?;

        let payload = RequestChildren { coin_name };
        let message = Message::new(
            ProtocolMessageType::RequestChildren,
            codec::encode(&payload)?,
        );

        let filter = Filter::request(message, move |msg| {
            if msg.msg_type != ProtocolMessageType::RespondChildren {
                return false;
            }
            decode_or_log::<RespondChildren>(msg).is_some_and(|r| {
                r.coin_states.is_empty() || r.coin_states[0].coin.parent_coin_info == coin_name
            })
        })
        .with_response_wait(self.response_wait);

        let frame = self.manager.register_filter(filter).await?.wait().await?;
        let response: RespondChildren = codec::decode(&frame.data)?;
        Ok(response.coin_states.iter().map(CoinState::from).collect())
    }

    /// Block header at a height. `None` when the node has no block there.
    pub async fn block_header(&self, height: u64) -> ProviderResult<Option<BlockHeader>> {
        let payload = RequestBlockHeader { height };
        let message = Message::new(
            ProtocolMessageType::RequestBlockHeader,
            codec::encode(&payload)?,
        );

        let filter = Filter::request(message, move |msg| match msg.msg_type {
            ProtocolMessageType::RespondBlockHeader => decode_or_log::<RespondBlockHeader>(msg)
                .is_some_and(|r| r.header_block.reward_chain_block.height == height),
            ProtocolMessageType::RejectHeaderRequest => {
                decode_or_log::<RejectHeaderRequest>(msg).is_some_and(|r| r.height == height)
            }
            _ => false,
        })
        .with_response_wait(self.response_wait);

        let frame = self.manager.register_filter(filter).await?.wait().await?;
        if frame.msg_type == ProtocolMessageType::RejectHeaderRequest {
            return Ok(None);
        }

        let response: RespondBlockHeader = codec::decode(&frame.data)?;
        Ok(Some(BlockHeader::from(&response.header_block)))
    }

    /// Block headers for an inclusive height range.
    ///
    /// `None` when the node cannot serve the range. Element `i` of the
    /// result is numbered `start_height + i`.
    pub async fn block_headers_range(
        &self,
        start_height: u64,
        end_height: u64,
    ) -> ProviderResult<Option<Vec<BlockHeader>>> {
        let payload = RequestHeaderBlocks {
            start_height,
            end_height,
        };
        let message = Message::new(
            ProtocolMessageType::RequestHeaderBlocks,
            codec::encode(&payload)?,
        );

        let filter = Filter::request(message, move |msg| match msg.msg_type {
            ProtocolMessageType::RespondHeaderBlocks => decode_or_log::<RespondHeaderBlocks>(msg)
                .is_some_and(|r| r.start_height == start_height && r.end_height == end_height),
            ProtocolMessageType::RejectHeaderBlocks => decode_or_log::<RejectHeaderBlocks>(msg)
                .is_some_and(|r| r.start_height == start_height && r.end_height == end_height),
            _ => false,
        })
        .with_response_wait(self.response_wait);

        let frame = self.manager.register_filter(filter).await?.wait().await?;
        if frame.msg_type == ProtocolMessageType::RejectHeaderBlocks {
            return Ok(None);
        }

        let response: RespondHeaderBlocks = codec::decode(&frame.data)?;
        let headers = response
            .header_blocks
            .iter()
            .enumerate()
            .map(|(i, header_block)| {
                let mut header = BlockHeader::from(header_block);
                header.height = start_height + i as u64;
                header
            })
            .collect();
        Ok(Some(headers))
    }

    /// Coins removed in a block, optionally restricted to given coin ids.
    ///
    /// `None` when any hex input is invalid (nothing is sent) or when the
    /// node rejects the request.
    pub async fn coin_removals(
        &self,
        height: u64,
        header_hash: &str,
        coin_ids: Option<&[String]>,
    ) -> ProviderResult<Option<Vec<Coin>>> {
        let header_hash = match address::validate_hash_hex(header_hash) {
            Some(hash) => hash,
            None => return Ok(None),
        };
        let coin_names = match validate_hashes(coin_ids) {
            Ok(names) => names,
            Err(()) => return Ok(None),
        };

        let payload = RequestRemovals {
            height,
            header_hash,
            coin_names,
        };
        let message = Message::new(
            ProtocolMessageType::RequestRemovals,
            codec::encode(&payload)?,
        );

        let filter = Filter::request(message, move |msg| match msg.msg_type {
            ProtocolMessageType::RespondRemovals => decode_or_log::<RespondRemovals>(msg)
                .is_some_and(|r| r.height == height && r.header_hash == header_hash),
            ProtocolMessageType::RejectRemovalsRequest => {
                decode_or_log::<RejectRemovalsRequest>(msg)
                    .is_some_and(|r| r.height == height && r.header_hash == header_hash)
            }
            _ => false,
        })
        .with_response_wait(self.response_wait);

        let frame = self.manager.register_filter(filter).await?.wait().await?;
        if frame.msg_type == ProtocolMessageType::RejectRemovalsRequest {
            return Ok(None);
        }

        let response: RespondRemovals = codec::decode(&frame.data)?;
        let coins = response
            .coins
            .iter()
            .filter_map(|(_, coin)| coin.as_ref())
            .map(Coin::from)
            .collect();
        Ok(Some(coins))
    }

    /// Coins created in a block, optionally restricted to given puzzle
    /// hashes.
    ///
    /// `None` when any hex input is invalid (nothing is sent) or when the
    /// node rejects the request.
    pub async fn coin_additions(
        &self,
        height: u64,
        header_hash: &str,
        puzzle_hashes: Option<&[String]>,
    ) -> ProviderResult<Option<Vec<Coin>>> {
        let header_hash = match address::validate_hash_hex(header_hash) {
            Some(hash) => hash,
            None => return Ok(None),
        };
        let puzzle_hashes = match validate_hashes(puzzle_hashes) {
            Ok(hashes) => hashes,
            Err(()) => return Ok(None),
        };

        let payload = RequestAdditions {
            height,
            header_hash,
            puzzle_hashes,
        };
        let message = Message::new(
            ProtocolMessageType::RequestAdditions,
            codec::encode(&payload)?,
        );

        let filter = Filter::request(message, move |msg| match msg.msg_type {
            ProtocolMessageType::RespondAdditions => decode_or_log::<RespondAdditions>(msg)
                .is_some_and(|r| r.height == height && r.header_hash == header_hash),
            ProtocolMessageType::RejectAdditionsRequest => {
                decode_or_log::<RejectAdditionsRequest>(msg)
                    .is_some_and(|r| r.height == height && r.header_hash == header_hash)
            }
            _ => false,
        })
        .with_response_wait(self.response_wait);

        let frame = self.manager.register_filter(filter).await?.wait().await?;
        if frame.msg_type == ProtocolMessageType::RejectAdditionsRequest {
            return Ok(None);
        }

        let response: RespondAdditions = codec::decode(&frame.data)?;
        let coins = response
            .coins
            .iter()
            .flat_map(|(_, group)| group.iter())
            .map(Coin::from)
            .collect();
        Ok(Some(coins))
    }

    // ------------------------------------------------------------------
    // Unsupported operations. This provider connects to a remote node and
    // holds no keys; failing with a typed error is the contract.
    // ------------------------------------------------------------------

    /// Unsupported: the provider manages no keys and has no own address.
    pub fn get_address(&self) -> ProviderResult<String> {
        Err(ProviderError::UnsupportedOperation("get_address"))
    }

    /// Unsupported: the provider cannot sign transfers.
    pub fn transfer(&self, _to_address: &str, _amount: u128) -> ProviderResult<()> {
        Err(ProviderError::UnsupportedOperation("transfer"))
    }

    /// Unsupported: the provider cannot sign CAT transfers.
    pub fn transfer_cat(
        &self,
        _to_address: &str,
        _asset_id: &str,
        _amount: u128,
    ) -> ProviderResult<()> {
        Err(ProviderError::UnsupportedOperation("transfer_cat"))
    }

    /// Unsupported: the provider cannot sign offers.
    pub fn accept_offer(&self, _offer: &str) -> ProviderResult<()> {
        Err(ProviderError::UnsupportedOperation("accept_offer"))
    }

    /// Unsupported: the provider has no own address to watch.
    pub fn subscribe_to_address_changes(&self) -> ProviderResult<Subscription> {
        Err(ProviderError::UnsupportedOperation(
            "subscribe_to_address_changes",
        ))
    }

    /// Access the underlying message manager (registry introspection,
    /// custom filters).
    pub fn manager(&self) -> &MessageManager {
        &self.manager
    }
}

/// Derive the puzzle hash a balance query targets.
///
/// An address carrying the configured prefix takes precedence; otherwise
/// the hex puzzle hash is used. `None` when neither yields 32 bytes.
fn resolve_puzzle_hash(request: &BalanceRequest, prefix: &str) -> Option<Bytes32> {
    if let Some(addr) = &request.address {
        if addr.starts_with(prefix) {
            return address::address_to_puzzle_hash(addr, prefix).ok();
        }
    }
    request
        .puzzle_hash
        .as_deref()
        .and_then(address::validate_hash_hex)
}

/// Validate a hex hash, raising `InvalidInput` on failure.
fn require_hash(value: &str, what: &str) -> ProviderResult<Bytes32> {
    address::validate_hash_hex(value)
        .ok_or_else(|| ProviderError::InvalidInput(format!("{} is not a 32-byte hex hash", what)))
}

/// Validate an optional list of hex hashes. `Err` when any entry is invalid.
fn validate_hashes(values: Option<&[String]>) -> Result<Option<Vec<Bytes32>>, ()> {
    match values {
        None => Ok(None),
        Some(items) => {
            let mut hashes = Vec::with_capacity(items.len());
            for item in items {
                match address::validate_hash_hex(item) {
                    Some(hash) => hashes.push(hash),
                    None => return Err(()),
                }
            }
            Ok(Some(hashes))
        }
    }
}

/// Decode a payload inside a predicate. Failures are logged and the frame
/// left for others (one bad frame never crashes dispatch).
fn decode_or_log<T: DeserializeOwned>(msg: &Message) -> Option<T> {
    match codec::decode(&msg.data) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::debug!(msg_type = %msg.msg_type, error = %e, "Dropping undecodable payload");
            None
        }
    }
}
