use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while building or querying the allow-list.
///
/// "Not a member" is deliberately absent: it is a normal answer and is
/// returned as [`crate::merkle::Membership::NotAMember`].
#[derive(Debug, Error)]
pub enum AllowlistError {
    /// The allow-list itself is malformed. Fatal at startup.
    #[error("invalid allow-list: {0}")]
    InvalidAllowlist(String),

    /// A queried address could not be parsed.
    #[error("invalid address format: {0}")]
    InvalidAddressFormat(String),

    /// A root or proof element is not 32 bytes of hex.
    #[error("invalid hash: {0}")]
    InvalidHash(String),

    #[error("failed to read allow-list {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
