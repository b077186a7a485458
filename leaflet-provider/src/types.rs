//! Public data model returned by provider operations.
//!
//! Wire types live in `leaflet-core`; these are the application-facing
//! shapes. Amounts widen to `u128` so balances can be summed without
//! overflow concerns.

use leaflet_core::types as wire;
use leaflet_core::Bytes32;

/// An unspent transaction output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Coin {
    /// Id of the coin this coin was created from.
    pub parent_coin_info: Bytes32,
    /// Hash commitment to the spend predicate.
    pub puzzle_hash: Bytes32,
    /// Amount in the smallest unit.
    pub amount: u128,
}

impl From<&wire::Coin> for Coin {
    fn from(coin: &wire::Coin) -> Self {
        Self {
            parent_coin_info: coin.parent_coin_info,
            puzzle_hash: coin.puzzle_hash,
            amount: coin.amount as u128,
        }
    }
}

/// Creation and spend status of a coin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoinState {
    /// The coin itself.
    pub coin: Coin,
    /// Height the coin was spent at, if spent.
    pub spent_height: Option<u64>,
    /// Height the coin was created at, if known.
    pub created_height: Option<u64>,
}

impl From<&wire::CoinState> for CoinState {
    fn from(state: &wire::CoinState) -> Self {
        Self {
            coin: Coin::from(&state.coin),
            spent_height: state.spent_height,
            created_height: state.created_height,
        }
    }
}

/// A block header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockHeader {
    /// Block height.
    pub height: u64,
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

impl From<&wire::HeaderBlock> for BlockHeader {
    fn from(header: &wire::HeaderBlock) -> Self {
        Self {
            height: header.reward_chain_block.height,
            header_hash: header.header_hash,
            prev_header_hash: header.prev_header_hash,
            is_transaction_block: header.is_transaction_block,
            timestamp: header.timestamp,
            fees: header.fees,
        }
    }
}

/// The puzzle reveal and solution of a spent coin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PuzzleSolution {
    /// Id of the spent coin.
    pub coin_name: Bytes32,
    /// Height the coin was spent at.
    pub height: u64,
    /// Serialized puzzle reveal.
    pub puzzle_reveal: Vec<u8>,
    /// Serialized solution.
    pub solution: Vec<u8>,
}
