//! Wallet protocol payloads.
//!
//! One struct per protocol message named in [`crate::message::ProtocolMessageType`].
//! All payloads are encoded with the deterministic codec in [`crate::codec`].
//!
//! Responses carry no correlation id; every response echoes enough of the
//! request (heights, hashes, coin names) for the requester to match it by
//! contents.

use serde::{Deserialize, Serialize};

use crate::types::{Bytes32, Coin, CoinState, HeaderBlock};

/// Node type advertised in the handshake: full node.
pub const NODE_TYPE_FULL_NODE: u8 = 1;

/// Node type advertised in the handshake: wallet.
pub const NODE_TYPE_WALLET: u8 = 6;

/// Protocol handshake, exchanged once per connection in both directions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Handshake {
    /// Network the peer is on (`mainnet`, `testnet*`).
    pub network_id: String,
    /// Protocol version string.
    pub protocol_version: String,
    /// Software version string.
    pub software_version: String,
    /// Listening port, zero for clients that do not accept connections.
    pub server_port: u16,
    /// Node type code ([`NODE_TYPE_WALLET`] for this adapter).
    pub node_type: u8,
    /// Capability flags as (code, value) pairs.
    pub capabilities: Vec<(u16, String)>,
}

/// Push notification: the node's chain tip advanced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPeakWallet {
    /// Hash of the new peak header.
    pub header_hash: Bytes32,
    /// Height of the new peak.
    pub height: u64,
    /// Cumulative weight of the new peak.
    pub weight: u128,
    /// Height of the fork point against the previous peak.
    pub fork_point_with_previous_peak: u64,
}

/// Register interest in puzzle hashes, from `min_height` onward.
///
/// The node replies with a snapshot and keeps pushing updates for the
/// registered hashes for the lifetime of the connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterForPhUpdates {
    /// Puzzle hashes to watch.
    pub puzzle_hashes: Vec<Bytes32>,
    /// Do not report states that were final below this height.
    pub min_height: u64,
}

/// Snapshot or update for registered puzzle hashes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RespondToPhUpdates {
    /// The registered puzzle hashes this response covers.
    pub puzzle_hashes: Vec<Bytes32>,
    /// Echo of the registration's minimum height.
    pub min_height: u64,
    /// Coin states touching the registered hashes.
    pub coin_states: Vec<CoinState>,
}

/// Register interest in specific coins, from `min_height` onward.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterForCoinUpdates {
    /// Coin ids to watch.
    pub coin_ids: Vec<Bytes32>,
    /// Do not report states that were final below this height.
    pub min_height: u64,
}

/// Snapshot or update for registered coins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RespondToCoinUpdates {
    /// The registered coin ids this response covers.
    pub coin_ids: Vec<Bytes32>,
    /// Echo of the registration's minimum height.
    pub min_height: u64,
    /// Coin states of the registered coins.
    pub coin_states: Vec<CoinState>,
}

/// Request the puzzle reveal and solution of a spent coin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestPuzzleSolution {
    /// Id of the spent coin.
    pub coin_name: Bytes32,
    /// Height the coin was spent at.
    pub height: u64,
}

/// Puzzle reveal and solution of a spent coin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PuzzleSolutionResponse {
    /// Id of the spent coin.
    pub coin_name: Bytes32,
    /// Height the coin was spent at.
    pub height: u64,
    /// Serialized puzzle reveal.
    pub puzzle: Vec<u8>,
    /// Serialized solution.
    pub solution: Vec<u8>,
}

/// Successful puzzle-solution response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RespondPuzzleSolution {
    /// The reveal and solution.
    pub response: PuzzleSolutionResponse,
}

/// The node does not have the requested puzzle solution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectPuzzleSolution {
    /// Echo of the requested coin id.
    pub coin_name: Bytes32,
    /// Echo of the requested height.
    pub height: u64,
}

/// Request a single block header by height.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestBlockHeader {
    /// Height of the requested header.
    pub height: u64,
}

/// Successful block-header response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RespondBlockHeader {
    /// The requested header.
    pub header_block: HeaderBlock,
}

/// The node does not have a header at the requested height.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectHeaderRequest {
    /// Echo of the requested height.
    pub height: u64,
}

/// Request a contiguous range of block headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestHeaderBlocks {
    /// First height in the range, inclusive.
    pub start_height: u64,
    /// Last height in the range, inclusive.
    pub end_height: u64,
}

/// Successful header-range response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RespondHeaderBlocks {
    /// Echo of the requested start height.
    pub start_height: u64,
    /// Echo of the requested end height.
    pub end_height: u64,
    /// Headers in height order; element `i` is at `start_height + i`.
    pub header_blocks: Vec<HeaderBlock>,
}

/// The node cannot serve the requested header range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectHeaderBlocks {
    /// Echo of the requested start height.
    pub start_height: u64,
    /// Echo of the requested end height.
    pub end_height: u64,
}

/// Request the coins removed in a block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestRemovals {
    /// Height of the block.
    pub height: u64,
    /// Hash of the block header.
    pub header_hash: Bytes32,
    /// Restrict the response to these coin ids; `None` returns all removals.
    pub coin_names: Option<Vec<Bytes32>>,
}

/// Coins removed in a block, keyed by coin id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RespondRemovals {
    /// Echo of the requested height.
    pub height: u64,
    /// Echo of the requested header hash.
    pub header_hash: Bytes32,
    /// Requested coin ids with the coin when it was removed in this block.
    pub coins: Vec<(Bytes32, Option<Coin>)>,
    /// Merkle inclusion proofs, when requested by id.
    pub proofs: Option<Vec<(Bytes32, Vec<u8>)>>,
}

/// The node cannot serve the removals request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectRemovalsRequest {
    /// Echo of the requested height.
    pub height: u64,
    /// Echo of the requested header hash.
    pub header_hash: Bytes32,
}

/// Request the coins created in a block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestAdditions {
    /// Height of the block.
    pub height: u64,
    /// Hash of the block header.
    pub header_hash: Bytes32,
    /// Restrict the response to these puzzle hashes; `None` returns all.
    pub puzzle_hashes: Option<Vec<Bytes32>>,
}

/// Coins created in a block, grouped by puzzle hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RespondAdditions {
    /// Echo of the requested height.
    pub height: u64,
    /// Echo of the requested header hash.
    pub header_hash: Bytes32,
    /// Puzzle hashes with the coins created for them in this block.
    pub coins: Vec<(Bytes32, Vec<Coin>)>,
    /// Merkle inclusion proofs, when requested by puzzle hash.
    pub proofs: Option<Vec<(Bytes32, Vec<u8>, Option<Vec<u8>>)>>,
}

/// The node cannot serve the additions request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectAdditionsRequest {
    /// Echo of the requested height.
    pub height: u64,
    /// Echo of the requested header hash.
    pub header_hash: Bytes32,
}

/// Request the children of a coin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestChildren {
    /// Id of the parent coin.
    pub coin_name: Bytes32,
}

/// Children of a coin. Empty when the coin has none.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RespondChildren {
    /// Coin states of the children.
    pub coin_states: Vec<CoinState>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec;

    #[test]
    fn test_handshake_roundtrip() {
        let hs = Handshake {
            network_id: "mainnet".to_string(),
            protocol_version: "0.0.34".to_string(),
            software_version: "leaflet/0.1.0".to_string(),
            server_port: 0,
            node_type: NODE_TYPE_WALLET,
            capabilities: vec![(1, "1".to_string())],
        };

        let bytes = codec::encode(&hs).unwrap();
        let recovered: Handshake = codec::decode(&bytes).unwrap();
        assert_eq!(hs, recovered);
    }

    #[test]
    fn test_removals_roundtrip_with_absent_coin() {
        let coin = Coin {
            parent_coin_info: [1u8; 32],
            puzzle_hash: [2u8; 32],
            amount: 5,
        };
        let removals = RespondRemovals {
            height: 10,
            header_hash: [9u8; 32],
            coins: vec![([3u8; 32], Some(coin)), ([4u8; 32], None)],
            proofs: None,
        };

        let bytes = codec::encode(&removals).unwrap();
        let recovered: RespondRemovals = codec::decode(&bytes).unwrap();
        assert_eq!(removals, recovered);
    }

    #[test]
    fn test_reject_echoes_request_keys() {
        let request = RequestPuzzleSolution {
            coin_name: [8u8; 32],
            height: 77,
        };
        let reject = RejectPuzzleSolution {
            coin_name: request.coin_name,
            height: request.height,
        };

        assert_eq!(reject.coin_name, request.coin_name);
        assert_eq!(reject.height, request.height);
    }
}
