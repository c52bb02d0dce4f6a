//! Sale rules: which phase is live, what a mint costs, when the supply is
//! exhausted, and what a given wallet may do right now.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::merkle::{Membership, MerkleProof};

/// 0.007 ether.
pub const DEFAULT_UNIT_PRICE_WEI: u128 = 7_000_000_000_000_000;
pub const DEFAULT_FREE_MINT_CAP: u64 = 900;
pub const DEFAULT_MAX_PER_TX: u32 = 2;
pub const DEFAULT_RESERVED_SUPPLY: u64 = 50;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SaleError {
    #[error("mint price overflows for quantity {quantity}")]
    PriceOverflow { quantity: u32 },
    #[error("quantity {quantity} outside 1..={max}")]
    InvalidQuantity { quantity: u32, max: u32 },
}

/// Contract state read on every poll.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleSnapshot {
    pub allowlist_mint_enabled: bool,
    pub public_mint_enabled: bool,
    pub total_supply: u64,
    pub max_supply: u64,
    pub total_free_minted: u64,
}

impl SaleSnapshot {
    pub fn phase(&self) -> MintPhase {
        MintPhase::from_flags(self.allowlist_mint_enabled, self.public_mint_enabled)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum MintPhase {
    Allowlist,
    Public,
    Closed,
}

impl MintPhase {
    /// The allow-list phase wins when the contract reports both flags.
    pub fn from_flags(allowlist_enabled: bool, public_enabled: bool) -> Self {
        if allowlist_enabled {
            MintPhase::Allowlist
        } else if public_enabled {
            MintPhase::Public
        } else {
            MintPhase::Closed
        }
    }
}

/// Number of tokens in one mint call, kept within `1..=max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quantity {
    value: u32,
    max: u32,
}

impl Quantity {
    pub fn new(value: u32, max: u32) -> Result<Self, SaleError> {
        if value == 0 || value > max {
            return Err(SaleError::InvalidQuantity { quantity: value, max });
        }
        Ok(Quantity { value, max })
    }

    pub fn one(max: u32) -> Self {
        Quantity {
            value: 1,
            max: max.max(1),
        }
    }

    pub fn get(&self) -> u32 {
        self.value
    }

    pub fn increment(&mut self) {
        if self.value < self.max {
            self.value += 1;
        }
    }

    pub fn decrement(&mut self) {
        if self.value > 1 {
            self.value -= 1;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SaleRules {
    /// Accepts a TOML integer or, for amounts past `u64`, a decimal string.
    #[serde(deserialize_with = "deserialize_wei")]
    pub unit_price_wei: u128,
    /// Free mints stay available while the contract-wide free count is at
    /// or below this cap.
    pub free_mint_cap: u64,
    pub max_per_tx: u32,
    /// Tokens held back from sale; the sale is over once only these remain.
    pub reserved_supply: u64,
}

fn deserialize_wei<'de, D>(deserializer: D) -> Result<u128, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Wei {
        Int(u64),
        Text(String),
    }

    match Wei::deserialize(deserializer)? {
        Wei::Int(wei) => Ok(u128::from(wei)),
        Wei::Text(text) => text.trim().parse::<u128>().map_err(|e| {
            serde::de::Error::custom(format!("invalid wei amount '{}': {}", text, e))
        }),
    }
}

impl Default for SaleRules {
    fn default() -> Self {
        SaleRules {
            unit_price_wei: DEFAULT_UNIT_PRICE_WEI,
            free_mint_cap: DEFAULT_FREE_MINT_CAP,
            max_per_tx: DEFAULT_MAX_PER_TX,
            reserved_supply: DEFAULT_RESERVED_SUPPLY,
        }
    }
}

impl SaleRules {
    pub fn quantity(&self, value: u32) -> Result<Quantity, SaleError> {
        Quantity::new(value, self.max_per_tx)
    }

    pub fn free_mint_available(&self, snapshot: &SaleSnapshot, minted_free: bool) -> bool {
        !minted_free && snapshot.total_free_minted <= self.free_mint_cap
    }

    /// Value to send with an allow-list mint. One token of the order is free
    /// when the wallet still has its free mint.
    pub fn allowlist_price(
        &self,
        quantity: Quantity,
        snapshot: &SaleSnapshot,
        minted_free: bool,
    ) -> Result<u128, SaleError> {
        let paid = if self.free_mint_available(snapshot, minted_free) {
            quantity.get() - 1
        } else {
            quantity.get()
        };
        self.price_of(paid, quantity)
    }

    pub fn public_price(&self, quantity: Quantity) -> Result<u128, SaleError> {
        self.price_of(quantity.get(), quantity)
    }

    fn price_of(&self, paid: u32, quantity: Quantity) -> Result<u128, SaleError> {
        self.unit_price_wei
            .checked_mul(u128::from(paid))
            .ok_or(SaleError::PriceOverflow {
                quantity: quantity.get(),
            })
    }

    pub fn is_sold_out(&self, snapshot: &SaleSnapshot) -> bool {
        snapshot.total_supply.saturating_add(self.reserved_supply) >= snapshot.max_supply
    }

    /// What the connected wallet may do given the latest contract state.
    pub fn decide(
        &self,
        snapshot: &SaleSnapshot,
        membership: &Membership,
        minted_free: bool,
        quantity: Quantity,
    ) -> Result<MintDecision, SaleError> {
        if self.is_sold_out(snapshot) {
            return Ok(MintDecision::SoldOut);
        }
        let decision = match (snapshot.phase(), membership) {
            (MintPhase::Allowlist, Membership::Member(proof)) => MintDecision::AllowlistMint {
                proof: proof.clone(),
                price_wei: self.allowlist_price(quantity, snapshot, minted_free)?,
            },
            (MintPhase::Allowlist, Membership::NotAMember) => MintDecision::NotAllowlisted,
            (MintPhase::Public, _) => MintDecision::PublicMint {
                price_wei: self.public_price(quantity)?,
            },
            (MintPhase::Closed, _) => MintDecision::NotLive,
        };
        Ok(decision)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MintDecision {
    SoldOut,
    NotLive,
    NotAllowlisted,
    AllowlistMint { proof: MerkleProof, price_wei: u128 },
    PublicMint { price_wei: u128 },
}

/// Formats a wei amount as ether with trailing zeros trimmed.
pub fn format_ether(wei: u128) -> String {
    const WEI_PER_ETHER: u128 = 1_000_000_000_000_000_000;
    let whole = wei / WEI_PER_ETHER;
    let frac = wei % WEI_PER_ETHER;
    if frac == 0 {
        return whole.to_string();
    }
    let frac = format!("{:018}", frac);
    format!("{}.{}", whole, frac.trim_end_matches('0'))
}
