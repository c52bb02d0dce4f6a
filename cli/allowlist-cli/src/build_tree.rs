use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use allowlist_cli::allowlist::load_tree;
use allowlist_cli::config::MintConfig;
use allowlist_cli::{hex_encode, AllowlistTree};

/// Build the Merkle tree from the allow-list and print its root
#[derive(Args, Debug)]
pub struct Cli {
    /// Allow-list file, one address per line (defaults to `allowlist.path`)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Output file for the Merkle root
    #[arg(short, long)]
    root_output: Option<PathBuf>,

    /// Output JSON file with every tree level
    #[arg(short, long)]
    tree_output: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct TreeOutput {
    root: String,
    leaf_count: usize,
    levels: Vec<Vec<String>>,
}

impl TreeOutput {
    fn new(tree: &AllowlistTree) -> Self {
        TreeOutput {
            root: hex_encode(tree.root()),
            leaf_count: tree.len(),
            levels: tree
                .levels()
                .iter()
                .map(|level| level.iter().map(hex_encode).collect())
                .collect(),
        }
    }
}

/// Resolves the allow-list path from the flag or the config file.
pub fn allowlist_path(input: Option<PathBuf>, config: &MintConfig) -> Result<PathBuf> {
    input
        .or_else(|| config.allowlist.path.clone())
        .context("No allow-list given: pass --input or set allowlist.path in the config")
}

pub fn run(args: Cli, config: &MintConfig) -> Result<()> {
    let input = allowlist_path(args.input, config)?;
    let tree = load_tree(&input).context("Failed to build allow-list tree")?;
    let root = hex_encode(tree.root());

    tracing::info!(addresses = tree.len(), %root, "Built Merkle tree");
    println!("{}", root);

    if let Some(root_path) = args.root_output {
        allowlist_cli::common::write_file_atomic(&root_path, &format!("{}\n", root))
            .context("Failed to write root")?;
    }

    if let Some(tree_path) = args.tree_output {
        tracing::info!("Writing Merkle tree to {:?}", tree_path);
        let json = serde_json::to_string_pretty(&TreeOutput::new(&tree))
            .context("Failed to serialize tree")?;
        allowlist_cli::common::write_file_atomic(&tree_path, &json)
            .context("Failed to write tree")?;
    }

    Ok(())
}
