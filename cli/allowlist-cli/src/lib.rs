pub mod allowlist;
pub mod chain;
pub mod client;
pub mod common;
pub mod config;
pub mod error;
pub mod merkle;
pub mod poller;
pub mod sale;

pub use common::{hash_pair, hex_encode, leaf_hash, parse_address, parse_hash, Address, Hash};
pub use error::AllowlistError;
pub use merkle::{verify, AllowlistTree, Membership, MerkleProof, EMPTY_ROOT};
