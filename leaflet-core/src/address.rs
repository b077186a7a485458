//! Puzzle-hash address encoding.
//!
//! Wallet addresses are the bech32m encoding of a 32-byte puzzle hash under
//! a human-readable prefix (`xch` on mainnet). Hex-encoded puzzle hashes are
//! accepted with or without a `0x` prefix.

use bech32::{FromBase32, ToBase32, Variant};

use crate::error::AddressError;

/// Human-readable prefix for mainnet addresses.
pub const DEFAULT_ADDRESS_PREFIX: &str = "xch";

/// Validate a hex-encoded 32-byte hash.
///
/// Accepts the hash with or without a leading `0x`. Returns `None` when the
/// string is not exactly 64 hex digits.
pub fn validate_hash_hex(value: &str) -> Option<[u8; 32]> {
    let stripped = value.strip_prefix("0x").unwrap_or(value);
    if stripped.len() != 64 {
        return None;
    }

    let bytes = hex::decode(stripped).ok()?;
    let mut hash = [0u8; 32];
    hash.copy_from_slice(&bytes);
    Some(hash)
}

/// Encode a 32-byte puzzle hash as a bech32m address.
pub fn puzzle_hash_to_address(
    puzzle_hash: &[u8; 32],
    prefix: &str,
) -> Result<String, AddressError> {
    bech32::encode(prefix, puzzle_hash.to_base32(), Variant::Bech32m)
        .map_err(|e| AddressError::InvalidEncoding(e.to_string()))
}

/// Decode a bech32m address into a 32-byte puzzle hash.
///
/// Rejects addresses with the wrong prefix, the plain-bech32 checksum
/// variant, or a payload that is not exactly 32 bytes.
pub fn address_to_puzzle_hash(address: &str, prefix: &str) -> Result<[u8; 32], AddressError> {
    let (hrp, data, variant) =
        bech32::decode(address).map_err(|e| AddressError::InvalidEncoding(e.to_string()))?;

    if variant != Variant::Bech32m {
        return Err(AddressError::NotBech32m);
    }
    if hrp != prefix {
        return Err(AddressError::WrongPrefix {
            expected: prefix.to_string(),
            actual: hrp,
        });
    }

    let bytes = Vec::<u8>::from_base32(&data)
        .map_err(|e| AddressError::InvalidEncoding(e.to_string()))?;
    if bytes.len() != 32 {
        return Err(AddressError::WrongLength(bytes.len()));
    }

    let mut hash = [0u8; 32];
    hash.copy_from_slice(&bytes);
    Ok(hash)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_hash_hex_accepts_plain_and_prefixed() {
        let plain = "11".repeat(32);
        let prefixed = format!("0x{}", plain);

        assert_eq!(validate_hash_hex(&plain), Some([0x11u8; 32]));
        assert_eq!(validate_hash_hex(&prefixed), Some([0x11u8; 32]));
    }

    #[test]
    fn test_validate_hash_hex_rejects_bad_input() {
        assert!(validate_hash_hex("").is_none());
        assert!(validate_hash_hex("abcd").is_none());
        assert!(validate_hash_hex(&"zz".repeat(32)).is_none());
        assert!(validate_hash_hex(&"11".repeat(33)).is_none());
    }

    #[test]
    fn test_address_roundtrip() {
        let puzzle_hash = [0x42u8; 32];

        let address = puzzle_hash_to_address(&puzzle_hash, DEFAULT_ADDRESS_PREFIX).unwrap();
        assert!(address.starts_with(DEFAULT_ADDRESS_PREFIX));

        let recovered = address_to_puzzle_hash(&address, DEFAULT_ADDRESS_PREFIX).unwrap();
        assert_eq!(recovered, puzzle_hash);
    }

    #[test]
    fn test_address_wrong_prefix() {
        let puzzle_hash = [0x42u8; 32];
        let address = puzzle_hash_to_address(&puzzle_hash, "txch").unwrap();

        let result = address_to_puzzle_hash(&address, DEFAULT_ADDRESS_PREFIX);
        assert!(matches!(result, Err(AddressError::WrongPrefix { .. })));
    }

    #[test]
    fn test_address_rejects_plain_bech32() {
        let puzzle_hash = [0x42u8; 32];
        let address =
            bech32::encode("xch", puzzle_hash.to_base32(), Variant::Bech32).unwrap();

        let result = address_to_puzzle_hash(&address, DEFAULT_ADDRESS_PREFIX);
        assert!(matches!(result, Err(AddressError::NotBech32m)));
    }

    #[test]
    fn test_address_rejects_garbage() {
        let result = address_to_puzzle_hash("xch1notanaddress", DEFAULT_ADDRESS_PREFIX);
        assert!(result.is_err());
    }
}
