//! Hashing utilities for build-node identity.
//!
//! Every node handed to the downstream executor is identified by a truncated
//! SHA-256 of its JSON serialization, so two rules with identical commands,
//! dependencies and installs always map to the same identity.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::consts::OBJ_HASH_PREFIX_LEN;

pub type HashError = serde_json::Error;

/// A content-addressed hash identifying one build-graph node.
///
/// The hash is a 20-character truncated SHA-256 of the JSON-serialized node,
/// rendered as lowercase hexadecimal.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeHash(pub String);

impl std::fmt::Display for NodeHash {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.0)
  }
}

pub trait Hashable: Serialize {
  fn compute_hash(&self) -> Result<NodeHash, HashError> {
    let serialized = serde_json::to_string(self)?;
    let full = hash_bytes(serialized.as_bytes());
    Ok(NodeHash(full[..OBJ_HASH_PREFIX_LEN].to_string()))
  }
}

/// Hash arbitrary bytes.
///
/// Returns the full 64-character SHA256 hash.
pub fn hash_bytes(data: &[u8]) -> String {
  let mut hasher = Sha256::new();
  hasher.update(data);
  format!("{:x}", hasher.finalize())
}
