//! Merkle tree over the allow-list and inclusion proofs keyed by address.
//!
//! Convention, shared with the on-chain verifier:
//!
//! - leaves are `keccak256(address)` kept in input order;
//! - a parent is `keccak256(min(a, b) || max(a, b))`;
//! - a lone node at the end of a level is promoted unchanged;
//! - the root of an empty tree is [`EMPTY_ROOT`].
//!
//! With sorted pairs a proof is just the list of siblings, which is what
//! OpenZeppelin's `MerkleProof.verify(proof, root, leaf)` consumes.

use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::common::{hash_pair, hex_encode, leaf_hash, parse_address, parse_hash, Address, Hash};
use crate::error::AllowlistError;

/// Root of a tree built from no addresses.
pub const EMPTY_ROOT: Hash = [0u8; 32];

/// Sibling hashes from a leaf up to the root.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MerkleProof(Vec<Hash>);

impl MerkleProof {
    pub fn new(siblings: Vec<Hash>) -> Self {
        MerkleProof(siblings)
    }

    pub fn siblings(&self) -> &[Hash] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Hex strings in the form contract calls take them.
    pub fn to_hex(&self) -> Vec<String> {
        self.0.iter().map(hex_encode).collect()
    }

    pub fn from_hex<S: AsRef<str>>(items: &[S]) -> Result<Self, AllowlistError> {
        let siblings = items
            .iter()
            .map(|s| parse_hash(s.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(MerkleProof(siblings))
    }
}

impl Serialize for MerkleProof {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_hex().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for MerkleProof {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let items = Vec::<String>::deserialize(deserializer)?;
        MerkleProof::from_hex(&items).map_err(serde::de::Error::custom)
    }
}

/// Answer to a membership query.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Membership {
    Member(MerkleProof),
    NotAMember,
}

impl Membership {
    pub fn is_member(&self) -> bool {
        matches!(self, Membership::Member(_))
    }

    pub fn proof(&self) -> Option<&MerkleProof> {
        match self {
            Membership::Member(proof) => Some(proof),
            Membership::NotAMember => None,
        }
    }
}

/// Immutable Merkle tree over a fixed allow-list.
///
/// `levels[0]` holds the leaves, the last level holds the root. The tree is
/// never modified after [`AllowlistTree::new`], so a shared reference can be
/// queried from any number of threads.
#[derive(Clone, Debug)]
pub struct AllowlistTree {
    addresses: Vec<Address>,
    index: HashMap<Address, usize>,
    levels: Vec<Vec<Hash>>,
}

impl AllowlistTree {
    /// Builds the tree from an ordered list of addresses.
    ///
    /// # Errors
    /// [`AllowlistError::InvalidAllowlist`] on a duplicate or zero address.
    pub fn new(addresses: Vec<Address>) -> Result<Self, AllowlistError> {
        let mut index = HashMap::with_capacity(addresses.len());
        for (position, address) in addresses.iter().enumerate() {
            if address.is_zero() {
                return Err(AllowlistError::InvalidAllowlist(format!(
                    "zero address at position {}",
                    position
                )));
            }
            if let Some(first) = index.insert(*address, position) {
                return Err(AllowlistError::InvalidAllowlist(format!(
                    "duplicate address {} at positions {} and {}",
                    address, first, position
                )));
            }
        }

        let leaves = addresses.iter().map(leaf_hash).collect();
        let levels = build_levels(leaves);

        Ok(AllowlistTree {
            addresses,
            index,
            levels,
        })
    }

    /// Parses and builds in one step.
    pub fn from_hex<S: AsRef<str>>(addresses: &[S]) -> Result<Self, AllowlistError> {
        let parsed = addresses
            .iter()
            .enumerate()
            .map(|(position, s)| {
                parse_address(s.as_ref()).map_err(|e| {
                    AllowlistError::InvalidAllowlist(format!("entry {}: {}", position, e))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(parsed)
    }

    pub fn root(&self) -> Hash {
        self.levels
            .last()
            .and_then(|level| level.first())
            .copied()
            .unwrap_or(EMPTY_ROOT)
    }

    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }

    pub fn addresses(&self) -> &[Address] {
        &self.addresses
    }

    /// Levels from leaves (index 0) to root.
    pub fn levels(&self) -> &[Vec<Hash>] {
        &self.levels
    }

    pub fn contains(&self, address: &Address) -> bool {
        self.index.contains_key(address)
    }

    pub fn leaf_index(&self, address: &Address) -> Option<usize> {
        self.index.get(address).copied()
    }

    /// Inclusion proof for `address`, or [`Membership::NotAMember`].
    pub fn proof_for(&self, address: &Address) -> Membership {
        match self.leaf_index(address) {
            Some(leaf_index) => Membership::Member(proof_at(&self.levels, leaf_index)),
            None => Membership::NotAMember,
        }
    }

    /// Like [`AllowlistTree::proof_for`] but takes the address as hex.
    ///
    /// # Errors
    /// [`AllowlistError::InvalidAddressFormat`] if `address` does not parse.
    pub fn proof_for_hex(&self, address: &str) -> Result<Membership, AllowlistError> {
        let address = parse_address(address)?;
        Ok(self.proof_for(&address))
    }
}

fn build_levels(leaves: Vec<Hash>) -> Vec<Vec<Hash>> {
    let mut levels = vec![leaves];

    while let Some(level) = levels.last().filter(|level| level.len() > 1) {
        let next_level: Vec<Hash> = level
            .chunks(2)
            .map(|chunk| match chunk {
                [left, right] => hash_pair(left, right),
                [lone] => *lone,
                _ => unreachable!("chunks(2) yields one or two nodes"),
            })
            .collect();
        levels.push(next_level);
    }

    levels
}

fn proof_at(levels: &[Vec<Hash>], leaf_index: usize) -> MerkleProof {
    let mut siblings = Vec::new();
    let mut current_index = leaf_index;

    // The root level has no siblings.
    for level in levels.iter().take(levels.len().saturating_sub(1)) {
        let sibling_index = current_index ^ 1;
        // A promoted node has no sibling on this level.
        if let Some(sibling) = level.get(sibling_index) {
            siblings.push(*sibling);
        }
        current_index /= 2;
    }

    MerkleProof(siblings)
}

/// Recomputes the root from a leaf and its siblings.
pub fn compute_root(leaf: Hash, proof: &MerkleProof) -> Hash {
    proof
        .siblings()
        .iter()
        .fold(leaf, |node, sibling| hash_pair(&node, sibling))
}

/// Checks that `proof` places `address` under `root`.
///
/// Needs nothing but the leaf and pair hash functions, so a contract or any
/// other verifier can reproduce it without the tree.
pub fn verify(address: &Address, proof: &MerkleProof, root: &Hash) -> bool {
    compute_root(leaf_hash(address), proof) == *root
}
