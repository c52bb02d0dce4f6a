use std::fmt;
use std::io::Write;
use std::path::Path;
use std::str::FromStr;

use anyhow::Context;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha3::{Digest, Keccak256};
use tempfile::NamedTempFile;

use crate::error::AllowlistError;

/// A 32-byte Keccak-256 digest: leaves, inner nodes and roots.
pub type Hash = [u8; 32];

/// A 20-byte account address.
///
/// Parsing accepts an optional `0x` prefix and either hex case; display is
/// always lower-case with the prefix, so two spellings of one account
/// compare equal.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address([u8; 20]);

impl Address {
    pub const ZERO: Address = Address([0u8; 20]);

    pub const fn new(bytes: [u8; 20]) -> Self {
        Address(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }
}

impl From<[u8; 20]> for Address {
    fn from(bytes: [u8; 20]) -> Self {
        Address(bytes)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({self})")
    }
}

impl FromStr for Address {
    type Err = AllowlistError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_address(s)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        parse_address(&s).map_err(serde::de::Error::custom)
    }
}

/// Parses an address from a hex string.
///
/// # Arguments
/// * `addr_str` - The address string, with or without "0x" prefix
///
/// # Errors
/// Returns [`AllowlistError::InvalidAddressFormat`] if the address is not
/// 40 hex characters or contains invalid hex
pub fn parse_address(addr_str: &str) -> Result<Address, AllowlistError> {
    let trimmed = addr_str.trim();
    let cleaned = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    if cleaned.len() != 40 {
        return Err(AllowlistError::InvalidAddressFormat(format!(
            "expected 40 hex chars, got {} in '{}'",
            cleaned.len(),
            trimmed
        )));
    }
    let mut address = [0u8; 20];
    hex::decode_to_slice(cleaned, &mut address).map_err(|e| {
        AllowlistError::InvalidAddressFormat(format!("invalid hex in '{}': {}", trimmed, e))
    })?;
    Ok(Address(address))
}

/// Keccak-256 of an arbitrary byte string.
pub fn keccak256(data: &[u8]) -> Hash {
    Keccak256::digest(data).into()
}

/// Hashes an address into its Merkle leaf: `keccak256(address_bytes)`.
pub fn leaf_hash(address: &Address) -> Hash {
    keccak256(address.as_bytes())
}

/// Hashes two nodes into their parent.
///
/// The pair is sorted byte-wise before hashing, so the result does not
/// depend on which child is on the left. Proofs therefore carry no
/// direction bits, matching OpenZeppelin's `MerkleProof.verify`.
pub fn hash_pair(a: &Hash, b: &Hash) -> Hash {
    let (left, right) = if a <= b { (a, b) } else { (b, a) };
    Keccak256::new()
        .chain_update(left)
        .chain_update(right)
        .finalize()
        .into()
}

/// Encodes bytes as `0x`-prefixed lower-case hex.
pub fn hex_encode(bytes: impl AsRef<[u8]>) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// Parses a 32-byte hash (root or proof element) from hex.
///
/// # Errors
/// Returns [`AllowlistError::InvalidHash`] if the input is not 64 hex chars
pub fn parse_hash(hash_str: &str) -> Result<Hash, AllowlistError> {
    let trimmed = hash_str.trim();
    let cleaned = trimmed.strip_prefix("0x").unwrap_or(trimmed);
    if cleaned.len() != 64 {
        return Err(AllowlistError::InvalidHash(format!(
            "expected 64 hex chars, got {} in '{}'",
            cleaned.len(),
            trimmed
        )));
    }
    let mut hash = [0u8; 32];
    hex::decode_to_slice(cleaned, &mut hash).map_err(|e| {
        AllowlistError::InvalidHash(format!("invalid hex in '{}': {}", trimmed, e))
    })?;
    Ok(hash)
}

/// Writes `contents` to `path` through a temp file in the same directory
/// and a rename, so readers never observe a half-written file.
pub fn write_file_atomic(path: &Path, contents: &str) -> anyhow::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut file = NamedTempFile::new_in(dir).context("Failed to create temp file")?;
    file.write_all(contents.as_bytes())
        .context("Failed to write to temp file")?;
    file.flush().context("Failed to flush temp file")?;
    file.persist(path)
        .context("Failed to move temp file to output")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_address_with_prefix() {
        let addr = "0x1234567890abcdef1234567890abcdef12345678";
        let result = parse_address(addr).unwrap();
        assert_eq!(result.to_string(), addr);
    }

    #[test]
    fn test_parse_address_without_prefix() {
        let addr = "1234567890abcdef1234567890abcdef12345678";
        let result = parse_address(addr).unwrap();
        assert_eq!(result.as_bytes()[0], 0x12);
    }

    #[test]
    fn test_parse_address_normalizes_case() {
        let lower = parse_address("0xabcdefabcdefabcdefabcdefabcdefabcdefabcd").unwrap();
        let upper = parse_address("0XABCDEFABCDEFABCDEFABCDEFABCDEFABCDEFABCD").unwrap();
        assert_eq!(lower, upper);
    }

    #[test]
    fn test_parse_address_invalid_length() {
        let result = parse_address("0x1234");
        assert!(matches!(
            result,
            Err(AllowlistError::InvalidAddressFormat(_))
        ));
    }

    #[test]
    fn test_parse_address_invalid_hex() {
        let result = parse_address("0xghijklmnopqrstuvwxyz1234567890abcdef1234");
        assert!(matches!(
            result,
            Err(AllowlistError::InvalidAddressFormat(_))
        ));
    }

    #[test]
    fn test_leaf_hash_is_keccak_of_address_bytes() {
        let address = Address::new([1u8; 20]);
        assert_eq!(leaf_hash(&address), keccak256(&[1u8; 20]));
        assert_ne!(leaf_hash(&address), leaf_hash(&Address::new([2u8; 20])));
    }

    #[test]
    fn test_keccak256_empty_input() {
        // Well-known digest of the empty string.
        assert_eq!(
            hex_encode(keccak256(b"")),
            "0xc5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
    }

    #[test]
    fn test_hash_pair_is_order_independent() {
        let a = [1u8; 32];
        let b = [2u8; 32];
        assert_eq!(hash_pair(&a, &b), hash_pair(&b, &a));

        let mut concatenated = [0u8; 64];
        concatenated[..32].copy_from_slice(&a);
        concatenated[32..].copy_from_slice(&b);
        assert_eq!(hash_pair(&b, &a), keccak256(&concatenated));
    }

    #[test]
    fn test_parse_hash() {
        let hash = [0xabu8; 32];
        assert_eq!(parse_hash(&hex_encode(hash)).unwrap(), hash);
        assert!(matches!(
            parse_hash("0x1234"),
            Err(AllowlistError::InvalidHash(_))
        ));
        assert!(matches!(
            parse_hash(&"zz".repeat(32)),
            Err(AllowlistError::InvalidHash(_))
        ));
    }

    #[test]
    fn test_address_serde_as_hex_string() {
        let address = Address::new([0xaa; 20]);
        let json = serde_json::to_string(&address).unwrap();
        assert_eq!(json, format!("\"0x{}\"", "aa".repeat(20)));
        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(back, address);
    }

    #[test]
    fn test_write_file_atomic() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("root.txt");
        write_file_atomic(&path, "0x00").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "0x00");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_write_file_atomic_sibling_and_tmp_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let txt = dir.path().join("root.txt");
        let json = dir.path().join("root.json");
        let tmp = dir.path().join("root.tmp");
        write_file_atomic(&txt, "text").unwrap();
        write_file_atomic(&json, "{}").unwrap();
        write_file_atomic(&tmp, "scratch").unwrap();

        assert_eq!(std::fs::read_to_string(&txt).unwrap(), "text");
        assert_eq!(std::fs::read_to_string(&json).unwrap(), "{}");
        assert_eq!(std::fs::read_to_string(&tmp).unwrap(), "scratch");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 3);
    }
}
