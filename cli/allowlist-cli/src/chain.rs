//! Boundary to the wallet and the mint contract.
//!
//! Both sides are async traits returning `Result`, so the client can be
//! driven by a browser wallet bridge, a JSON-RPC node, or an in-memory mock
//! in tests. Implementations make a single attempt per call; there is no
//! retry at this layer.

use std::fmt;

use async_trait::async_trait;
use k256::ecdsa::SigningKey;
use serde::Serialize;
use sha3::{Digest, Keccak256};
use thiserror::Error;
use zeroize::Zeroize;

use crate::common::{hex_encode, Address, Hash};
use crate::merkle::MerkleProof;
use crate::sale::SaleSnapshot;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainError {
    #[error("wrong network: expected chain id {expected}, wallet is on {actual}")]
    WrongNetwork { expected: u64, actual: u64 },
    #[error("wallet provider error: {0}")]
    Provider(String),
    #[error("contract call failed: {0}")]
    Contract(String),
}

/// Transaction hash returned by a submitted mint.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct TxHash(pub Hash);

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex_encode(self.0))
    }
}

impl fmt::Debug for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TxHash({self})")
    }
}

/// Arguments of the contract's allow-list `mint(quantity, proof)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AllowlistMintCall {
    pub quantity: u32,
    pub proof: MerkleProof,
    pub value_wei: u128,
}

/// Arguments of the contract's `publicMint(quantity)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublicMintCall {
    pub quantity: u32,
    pub value_wei: u128,
}

#[async_trait]
pub trait WalletProvider: Send + Sync {
    async fn chain_id(&self) -> Result<u64, ChainError>;

    /// Address of the connected signer.
    async fn address(&self) -> Result<Address, ChainError>;
}

#[async_trait]
pub trait MintContract: Send + Sync {
    async fn snapshot(&self) -> Result<SaleSnapshot, ChainError>;

    /// Whether `address` has already used its free allow-list mint.
    async fn minted_free(&self, address: &Address) -> Result<bool, ChainError>;

    async fn mint(&self, call: &AllowlistMintCall) -> Result<TxHash, ChainError>;

    async fn public_mint(&self, call: &PublicMintCall) -> Result<TxHash, ChainError>;
}

/// Wallet backed by a raw secp256k1 key, for scripting and tests.
pub struct LocalWallet {
    signing_key: SigningKey,
    chain_id: u64,
}

impl LocalWallet {
    pub fn new(signing_key: SigningKey, chain_id: u64) -> Self {
        LocalWallet {
            signing_key,
            chain_id,
        }
    }

    /// Parses a hex private key, wiping the intermediate buffers.
    pub fn from_hex(key_str: &str, chain_id: u64) -> Result<Self, ChainError> {
        let key_str = key_str.trim();
        let key_str = key_str.strip_prefix("0x").unwrap_or(key_str);
        if key_str.is_empty() {
            return Err(ChainError::Provider("private key is empty".into()));
        }
        let mut key_bytes = hex::decode(key_str)
            .map_err(|e| ChainError::Provider(format!("invalid private key format: {}", e)))?;
        if key_bytes.len() != 32 {
            let len = key_bytes.len();
            key_bytes.zeroize();
            return Err(ChainError::Provider(format!(
                "invalid private key length: expected 32 bytes, got {}",
                len
            )));
        }
        let signing_key = SigningKey::from_slice(&key_bytes);
        key_bytes.zeroize();
        let signing_key =
            signing_key.map_err(|e| ChainError::Provider(format!("invalid private key: {}", e)))?;
        Ok(LocalWallet::new(signing_key, chain_id))
    }

    pub fn address(&self) -> Address {
        address_of(&self.signing_key)
    }
}

/// Account address of a key: the last 20 bytes of the Keccak-256 of the
/// uncompressed public key without its `0x04` tag.
pub fn address_of(signing_key: &SigningKey) -> Address {
    let encoded = signing_key.verifying_key().to_encoded_point(false);
    let hash = Keccak256::digest(&encoded.as_bytes()[1..]);
    let mut address = [0u8; 20];
    address.copy_from_slice(&hash[12..32]);
    Address::new(address)
}

#[async_trait]
impl WalletProvider for LocalWallet {
    async fn chain_id(&self) -> Result<u64, ChainError> {
        Ok(self.chain_id)
    }

    async fn address(&self) -> Result<Address, ChainError> {
        Ok(address_of(&self.signing_key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_key_address() {
        // Private key 1 maps to the generator point.
        let mut key = [0u8; 32];
        key[31] = 1;
        let wallet = LocalWallet::from_hex(&hex::encode(key), 5).unwrap();
        assert_eq!(
            wallet.address().to_string(),
            "0x7e5f4552091a69125d5dfcb7b8c2659029395bdf"
        );
    }

    #[test]
    fn test_address_deterministic() {
        let key = hex::encode([42u8; 32]);
        let first = LocalWallet::from_hex(&key, 5).unwrap();
        let second = LocalWallet::from_hex(&format!("0x{}", key), 5).unwrap();
        assert_eq!(first.address(), second.address());
        assert!(!first.address().is_zero());
    }

    #[test]
    fn test_rejects_bad_keys() {
        assert!(LocalWallet::from_hex("", 5).is_err());
        assert!(LocalWallet::from_hex("0x1234", 5).is_err());
        assert!(LocalWallet::from_hex(&"zz".repeat(32), 5).is_err());
        // Zero is not a valid scalar.
        assert!(LocalWallet::from_hex(&"00".repeat(32), 5).is_err());
    }

    #[tokio::test]
    async fn test_wallet_provider_impl() {
        let wallet = LocalWallet::from_hex(&hex::encode([7u8; 32]), 5).unwrap();
        let provider: &dyn WalletProvider = &wallet;
        assert_eq!(provider.chain_id().await.unwrap(), 5);
        assert_eq!(provider.address().await.unwrap(), wallet.address());
    }
}
