use anyhow::{Context, Result};
use clap::Args;

use allowlist_cli::config::MintConfig;
use allowlist_cli::sale::{format_ether, MintPhase, SaleRules, SaleSnapshot};

/// Print the value to send with a mint
#[derive(Args, Debug)]
pub struct Cli {
    /// Sale phase to price for
    #[arg(long, value_enum)]
    phase: MintPhase,

    /// Tokens in the mint call
    #[arg(short, long, default_value_t = 1)]
    quantity: u32,

    /// Contract-wide count of free mints so far
    #[arg(long, default_value_t = 0)]
    total_free_minted: u64,

    /// The wallet has already used its free mint
    #[arg(long)]
    minted_free: bool,
}

pub fn quote(args: &Cli, rules: &SaleRules) -> Result<u128> {
    let quantity = rules.quantity(args.quantity)?;
    let price = match args.phase {
        MintPhase::Allowlist => {
            let snapshot = SaleSnapshot {
                allowlist_mint_enabled: true,
                total_free_minted: args.total_free_minted,
                ..SaleSnapshot::default()
            };
            rules.allowlist_price(quantity, &snapshot, args.minted_free)?
        }
        MintPhase::Public => rules.public_price(quantity)?,
        MintPhase::Closed => anyhow::bail!("Mint is not live in the closed phase"),
    };
    Ok(price)
}

pub fn run(args: &Cli, config: &MintConfig) -> Result<()> {
    let price = quote(args, &config.sale).context("Failed to quote mint price")?;
    tracing::debug!(phase = ?args.phase, quantity = args.quantity, price_wei = %price, "Quoted mint");
    println!("{} wei ({} ETH)", price, format_ether(price));
    Ok(())
}
