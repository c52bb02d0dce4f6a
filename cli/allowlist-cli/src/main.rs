#![forbid(unsafe_code)]
#![allow(unreachable_pub)]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use allowlist_cli::config::MintConfig;

mod build_tree;
mod proof;
mod quote;
mod verify;

#[derive(Parser, Debug)]
#[command(name = "allowlist")]
#[command(about = "Merkle allow-list tools for the two-phase mint", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to the TOML config file
    #[arg(short, long, global = true, default_value = "mint.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    BuildTree(build_tree::Cli),
    Proof(proof::Cli),
    Verify(verify::Cli),
    Quote(quote::Cli),
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    dispatch(Cli::parse())
}

/// Runs a subcommand. `verify` needs nothing but its arguments, so the
/// config file is only read for the others.
fn dispatch(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::BuildTree(args) => build_tree::run(args, &MintConfig::load(&cli.config)?)?,
        Commands::Proof(args) => proof::run(args, &MintConfig::load(&cli.config)?)?,
        Commands::Verify(args) => verify::run(&args)?,
        Commands::Quote(args) => quote::run(&args, &MintConfig::load(&cli.config)?)?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use allowlist_cli::{hex_encode, leaf_hash, parse_address};

    const MEMBER: &str = "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa01";

    fn broken_config() -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mint.toml");
        std::fs::write(&path, "[network\nchain_id = ").unwrap();
        (dir, path)
    }

    #[test]
    fn verify_ignores_broken_config() {
        let (_dir, config) = broken_config();
        // A one-address tree has the leaf as its root and an empty proof.
        let root = hex_encode(leaf_hash(&parse_address(MEMBER).unwrap()));
        let cli = Cli::try_parse_from([
            "allowlist",
            "--config",
            config.to_str().unwrap(),
            "verify",
            "--address",
            MEMBER,
            "--root",
            root.as_str(),
        ])
        .unwrap();
        assert!(dispatch(cli).is_ok());
    }

    #[test]
    fn quote_reports_broken_config() {
        let (_dir, config) = broken_config();
        let cli = Cli::try_parse_from([
            "allowlist",
            "--config",
            config.to_str().unwrap(),
            "quote",
            "--phase",
            "public",
        ])
        .unwrap();
        assert!(dispatch(cli).is_err());
    }
}
