use anyhow::{Context, Result};
use clap::Args;

use allowlist_cli::{parse_address, parse_hash, verify, MerkleProof};

/// Check an allow-list proof against a published root
#[derive(Args, Debug)]
pub struct Cli {
    /// Wallet address the proof is for
    #[arg(short, long)]
    address: String,

    /// Published Merkle root (hex)
    #[arg(short, long)]
    root: String,

    /// Sibling hashes from leaf to root, in order
    #[arg(short, long = "proof", num_args = 0..)]
    proof: Vec<String>,
}

pub fn check(args: &Cli) -> Result<bool> {
    let address = parse_address(&args.address).context("Invalid address")?;
    let root = parse_hash(&args.root).context("Invalid Merkle root")?;
    let proof = MerkleProof::from_hex(&args.proof).context("Invalid proof element")?;
    Ok(verify(&address, &proof, &root))
}

pub fn run(args: &Cli) -> Result<()> {
    if check(args)? {
        println!("valid");
        Ok(())
    } else {
        println!("invalid");
        anyhow::bail!("Proof does not place {} under root {}", args.address, args.root)
    }
}
