use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use zeroize::Zeroize;

use allowlist_cli::allowlist::load_tree;
use allowlist_cli::chain::LocalWallet;
use allowlist_cli::common::write_file_atomic;
use allowlist_cli::config::MintConfig;
use allowlist_cli::{hex_encode, parse_address, Address, AllowlistTree, Membership, MerkleProof};

use crate::build_tree::allowlist_path;

/// Produce the allow-list proof for one wallet
#[derive(Args, Debug)]
pub struct Cli {
    /// Allow-list file (defaults to `allowlist.path`)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Wallet address to prove
    #[arg(short, long, conflicts_with = "private_key", required_unless_present = "private_key")]
    address: Option<String>,

    /// Derive the address from a private key instead.
    /// Use "-" to read it from stdin
    #[arg(short = 'k', long)]
    private_key: Option<String>,

    /// Output JSON file
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct ProofOutput {
    address: Address,
    root: String,
    member: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    proof: Option<MerkleProof>,
}

fn resolve_address(args: &Cli, chain_id: u64) -> Result<Address> {
    if let Some(address) = &args.address {
        return parse_address(address).context("Invalid address");
    }

    let mut key_str = match args.private_key.as_deref() {
        Some("-") => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_line(&mut buffer)
                .context("Failed to read private key from stdin")?;
            buffer
        }
        Some(key) => key.to_string(),
        None => anyhow::bail!("Either --address or --private-key is required"),
    };
    let wallet = LocalWallet::from_hex(&key_str, chain_id);
    key_str.zeroize();
    Ok(wallet.context("Invalid private key")?.address())
}

fn proof_output(tree: &AllowlistTree, address: Address) -> ProofOutput {
    let membership = tree.proof_for(&address);
    ProofOutput {
        address,
        root: hex_encode(tree.root()),
        member: membership.is_member(),
        proof: match membership {
            Membership::Member(proof) => Some(proof),
            Membership::NotAMember => None,
        },
    }
}

pub fn run(args: Cli, config: &MintConfig) -> Result<()> {
    let address = resolve_address(&args, config.network.chain_id)?;
    let input = allowlist_path(args.input.clone(), config)?;
    let tree = load_tree(&input).context("Failed to build allow-list tree")?;

    let output = proof_output(&tree, address);
    match &output.proof {
        Some(proof) => tracing::info!(%address, siblings = proof.len(), "Address is allow-listed"),
        None => tracing::info!(%address, "Address is not a member of the allow-list"),
    }

    let json = serde_json::to_string_pretty(&output).context("Failed to serialize proof")?;
    match args.output {
        Some(path) => write_file_atomic(&path, &json).context("Failed to write proof file")?,
        None => println!("{}", json),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree() -> AllowlistTree {
        AllowlistTree::from_hex(&[
            "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa01",
            "0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb02",
            "0xcccccccccccccccccccccccccccccccccccccc03",
        ])
        .unwrap()
    }

    fn cli(address: Option<&str>, private_key: Option<&str>) -> Cli {
        Cli {
            input: None,
            address: address.map(str::to_string),
            private_key: private_key.map(str::to_string),
            output: None,
        }
    }

    #[test]
    fn test_member_output() {
        let address = parse_address("0xBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBB02").unwrap();
        let output = proof_output(&tree(), address);
        assert!(output.member);
        assert_eq!(output.proof.unwrap().len(), 2);
    }

    #[test]
    fn test_non_member_output_has_no_proof() {
        let address = parse_address("0xdddddddddddddddddddddddddddddddddddddd04").unwrap();
        let output = proof_output(&tree(), address);
        assert!(!output.member);
        let json = serde_json::to_value(&output).unwrap();
        assert!(json.get("proof").is_none());
    }

    #[test]
    fn test_resolve_address_from_key() {
        let key = format!("0x{}{}", "00".repeat(31), "01");
        let address = resolve_address(&cli(None, Some(&key)), 5).unwrap();
        assert_eq!(
            address.to_string(),
            "0x7e5f4552091a69125d5dfcb7b8c2659029395bdf"
        );
    }

    #[test]
    fn test_resolve_address_rejects_garbage() {
        assert!(resolve_address(&cli(Some("0x12"), None), 5).is_err());
        assert!(resolve_address(&cli(None, Some("0x12")), 5).is_err());
        assert!(resolve_address(&cli(None, None), 5).is_err());
    }
}
