//! Coin-id derivation.
//!
//! A coin id commits to the full coin: SHA-256 over the parent coin id, the
//! puzzle hash, and the canonical encoding of the amount. Subscription
//! predicates match pushed coin states against a target id by recomputing
//! this digest, so the encoding must agree byte-for-byte with what the node
//! hashes.

use sha2::{Digest, Sha256};

/// Canonical byte encoding of a coin amount.
///
/// Minimal big-endian two's-complement encoding:
/// - zero encodes as the empty byte string
/// - leading zero bytes are stripped
/// - a leading 0x00 is kept when the top bit of the first byte is set,
///   so the value is never read back as negative
pub fn canonical_amount_bytes(amount: u64) -> Vec<u8> {
    if amount == 0 {
        return Vec::new();
    }

    let be = amount.to_be_bytes();
    let first = be.iter().position(|&b| b != 0).unwrap_or(be.len() - 1);

    let mut out = Vec::with_capacity(be.len() - first + 1);
    if be[first] & 0x80 != 0 {
        out.push(0x00);
    }
    out.extend_from_slice(&be[first..]);
    out
}

/// Compute a coin id.
///
/// The coin id is the SHA-256 digest of
/// `parent_coin_info || puzzle_hash || canonical_amount_bytes(amount)`.
pub fn coin_id(parent_coin_info: &[u8; 32], puzzle_hash: &[u8; 32], amount: u64) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(parent_coin_info);
    hasher.update(puzzle_hash);
    hasher.update(canonical_amount_bytes(amount));
    hasher.finalize().into()
}
