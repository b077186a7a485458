//! Wallet protocol data types.
//!
//! These are the wire-level shapes carried inside protocol message payloads.
//! Amounts are `u64` on the wire; the provider crate widens them to `u128`
//! in its public model.

use serde::{Deserialize, Serialize};

use crate::hashing;

/// A 32-byte hash (puzzle hash, coin id, header hash).
pub type Bytes32 = [u8; 32];

/// An unspent transaction output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coin {
    /// Id of the coin this coin was created from.
    pub parent_coin_info: Bytes32,
    /// Hash commitment to the spend predicate.
    pub puzzle_hash: Bytes32,
    /// Amount in the smallest unit.
    pub amount: u64,
}

impl Coin {
    /// Compute this coin's id.
    pub fn coin_id(&self) -> Bytes32 {
        hashing::coin_id(&self.parent_coin_info, &self.puzzle_hash, self.amount)
    }
}

/// Creation and spend status of a coin as reported by the full node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoinState {
    /// The coin itself.
    pub coin: Coin,
    /// Height the coin was spent at, if spent.
    pub spent_height: Option<u64>,
    /// Height the coin was created at, if known.
    pub created_height: Option<u64>,
}

/// Consensus fields of a block as relevant to wallet queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardChainBlock {
    /// Block height.
    pub height: u64,
    /// Cumulative chain weight at this block.
    pub weight: u128,
}

/// A block header as returned by header queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderBlock {
    /// Consensus fields.
    pub reward_chain_block: RewardChainBlock,
    /// Hash of this header.
    pub header_hash: Bytes32,
    /// Hash of the previous header.
    pub prev_header_hash: Bytes32,
    /// Whether this block finishes a transaction generator.
    pub is_transaction_block: bool,
    /// Block timestamp (transaction blocks only).
    pub timestamp: Option<u64>,
    /// Total fees in the block (transaction blocks only).
    pub fees: Option<u64>,
}
