//! Mint client: connects a wallet, looks up its allow-list proof once, and
//! turns the current sale state into a contract call.

use std::sync::Arc;

use thiserror::Error;

use crate::chain::{
    AllowlistMintCall, ChainError, MintContract, PublicMintCall, TxHash, WalletProvider,
};
use crate::common::{hex_encode, Address};
use crate::merkle::{AllowlistTree, Membership};
use crate::sale::{MintDecision, Quantity, SaleError, SaleRules, SaleSnapshot};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Chain(#[from] ChainError),
    #[error(transparent)]
    Sale(#[from] SaleError),
    #[error("wallet {0} is not on the allow-list")]
    NotEligible(Address),
    #[error("sale is sold out")]
    SoldOut,
    #[error("mint is not live")]
    NotLive,
}

/// Static inputs shared by every session.
pub struct MintClient {
    contract: Arc<dyn MintContract>,
    tree: Arc<AllowlistTree>,
    rules: SaleRules,
    chain_id: u64,
}

impl MintClient {
    pub fn new(
        contract: Arc<dyn MintContract>,
        tree: Arc<AllowlistTree>,
        rules: SaleRules,
        chain_id: u64,
    ) -> Self {
        MintClient {
            contract,
            tree,
            rules,
            chain_id,
        }
    }

    pub fn contract(&self) -> &Arc<dyn MintContract> {
        &self.contract
    }

    pub fn rules(&self) -> &SaleRules {
        &self.rules
    }

    /// Connects `wallet`, refusing it when it is on another chain, and
    /// computes its allow-list membership.
    pub async fn connect(&self, wallet: &dyn WalletProvider) -> Result<Session<'_>, ClientError> {
        let actual = wallet.chain_id().await?;
        if actual != self.chain_id {
            return Err(ChainError::WrongNetwork {
                expected: self.chain_id,
                actual,
            }
            .into());
        }

        let address = wallet.address().await?;
        let membership = self.tree.proof_for(&address);
        tracing::info!(
            %address,
            allowlisted = membership.is_member(),
            root = %hex_encode(self.tree.root()),
            "Wallet connected"
        );

        Ok(Session {
            client: self,
            address,
            membership,
        })
    }
}

/// A connected wallet.
pub struct Session<'a> {
    client: &'a MintClient,
    address: Address,
    membership: Membership,
}

impl Session<'_> {
    pub fn address(&self) -> Address {
        self.address
    }

    pub fn membership(&self) -> &Membership {
        &self.membership
    }

    /// Reads the wallet's free-mint flag and decides what it may mint.
    pub async fn decide(
        &self,
        snapshot: &SaleSnapshot,
        quantity: Quantity,
    ) -> Result<MintDecision, ClientError> {
        let minted_free = self.client.contract.minted_free(&self.address).await?;
        let decision = self
            .client
            .rules
            .decide(snapshot, &self.membership, minted_free, quantity)?;
        Ok(decision)
    }

    /// Submits the mint the current phase allows.
    pub async fn mint(&self, quantity: Quantity) -> Result<TxHash, ClientError> {
        let snapshot = self.client.contract.snapshot().await?;
        let contract = &self.client.contract;

        let tx_hash = match self.decide(&snapshot, quantity).await? {
            MintDecision::AllowlistMint { proof, price_wei } => {
                let call = AllowlistMintCall {
                    quantity: quantity.get(),
                    proof,
                    value_wei: price_wei,
                };
                contract.mint(&call).await?
            }
            MintDecision::PublicMint { price_wei } => {
                let call = PublicMintCall {
                    quantity: quantity.get(),
                    value_wei: price_wei,
                };
                contract.public_mint(&call).await?
            }
            MintDecision::NotAllowlisted => return Err(ClientError::NotEligible(self.address)),
            MintDecision::SoldOut => return Err(ClientError::SoldOut),
            MintDecision::NotLive => return Err(ClientError::NotLive),
        };

        tracing::info!(
            address = %self.address,
            quantity = quantity.get(),
            %tx_hash,
            "Mint submitted"
        );
        Ok(tx_hash)
    }
}
