use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::common::{parse_address, Address};
use crate::error::AllowlistError;
use crate::merkle::AllowlistTree;

/// Parses a plain-text allow-list: one hex address per line.
///
/// Blank lines and `#` comments are skipped. Every other line must hold a
/// single address; a malformed or repeated address rejects the whole list
/// with the 1-based line number.
pub fn parse_allowlist(contents: &str) -> Result<Vec<Address>, AllowlistError> {
    let mut addresses = Vec::new();
    let mut seen: HashMap<Address, usize> = HashMap::new();

    for (line_num, line) in contents.lines().enumerate() {
        let line_num = line_num + 1;
        let entry = line.split('#').next().unwrap_or_default().trim();
        if entry.is_empty() {
            continue;
        }

        let address = parse_address(entry).map_err(|e| {
            AllowlistError::InvalidAllowlist(format!("line {}: {}", line_num, e))
        })?;
        if address.is_zero() {
            return Err(AllowlistError::InvalidAllowlist(format!(
                "line {}: zero address not allowed",
                line_num
            )));
        }
        if let Some(first) = seen.insert(address, line_num) {
            return Err(AllowlistError::InvalidAllowlist(format!(
                "line {}: duplicate of {} on line {}",
                line_num, address, first
            )));
        }
        addresses.push(address);
    }

    Ok(addresses)
}

/// Reads and parses an allow-list file.
pub fn load_allowlist(path: &Path) -> Result<Vec<Address>, AllowlistError> {
    let contents = fs::read_to_string(path).map_err(|source| AllowlistError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let addresses = parse_allowlist(&contents)?;
    tracing::info!(
        path = %path.display(),
        count = addresses.len(),
        "Loaded allow-list"
    );
    Ok(addresses)
}

/// Loads an allow-list file and builds its tree.
pub fn load_tree(path: &Path) -> Result<AllowlistTree, AllowlistError> {
    let tree = AllowlistTree::new(load_allowlist(path)?)?;
    tracing::debug!(root = %crate::common::hex_encode(tree.root()), "Built allow-list tree");
    Ok(tree)
}
