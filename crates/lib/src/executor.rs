//! Downstream executor interface.
//!
//! Finalized rules leave this crate as [`BuildNode`]s: a self-contained
//! description that a generic DAG scheduler can run without knowing anything
//! about modules or variants. Registration is fire-and-forget; nothing here
//! runs a command.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::trace;

use crate::rule::{InstallPair, Installs};
use crate::util::hash::{HashError, Hashable, NodeHash};

/// A build-graph node as consumed by the executor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildNode {
  /// Rule name.
  pub name: String,

  /// Human-readable description printed while the node runs.
  pub description: String,

  /// Commands joined into one shell invocation.
  pub command: String,

  /// The individual commands, in execution order.
  pub commands: Vec<String>,

  /// Sorted external inputs.
  pub inputs: Vec<String>,

  /// Sorted outputs.
  pub outputs: Vec<String>,

  /// Sorted tools, treated as additional implicit inputs.
  pub tools: Vec<String>,

  /// Output to install-destination mappings for the install-graph builder.
  #[serde(default, skip_serializing_if = "Installs::is_empty")]
  pub installs: Installs,
}

impl Hashable for BuildNode {}

/// Errors raised when registering a node.
#[derive(Debug, Error)]
pub enum ExecutorError {
  /// Two nodes claim the same output file.
  #[error("output {output} is already produced by node {existing}")]
  DuplicateOutput { output: String, existing: NodeHash },

  #[error("failed to hash node: {0}")]
  Hash(#[from] HashError),
}

/// Receiver of finalized build-graph nodes.
pub trait Executor {
  /// Register a node and return its identity.
  fn register(&mut self, node: BuildNode) -> Result<NodeHash, ExecutorError>;
}

/// Staging buffer: accepts every node and defers validation to the graph it
/// is eventually merged into.
impl Executor for Vec<BuildNode> {
  fn register(&mut self, node: BuildNode) -> Result<NodeHash, ExecutorError> {
    let hash = node.compute_hash()?;
    self.push(node);
    Ok(hash)
  }
}

/// A node together with its identity, as written to the graph document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphEntry {
  pub hash: NodeHash,
  #[serde(flatten)]
  pub node: BuildNode,
}

/// The collected build graph handed to the downstream scheduler.
///
/// Every output file has exactly one producing node.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BuildGraph {
  nodes: Vec<GraphEntry>,

  #[serde(skip)]
  by_hash: HashMap<NodeHash, usize>,

  #[serde(skip)]
  by_output: HashMap<String, NodeHash>,
}

impl BuildGraph {
  pub fn new() -> Self {
    Self::default()
  }

  /// Nodes in registration order.
  pub fn nodes(&self) -> impl Iterator<Item = &GraphEntry> {
    self.nodes.iter()
  }

  pub fn node(&self, hash: &NodeHash) -> Option<&BuildNode> {
    self.by_hash.get(hash).map(|&idx| &self.nodes[idx].node)
  }

  /// The node producing `output`, if any.
  pub fn producer(&self, output: &str) -> Option<&NodeHash> {
    self.by_output.get(output)
  }

  pub fn len(&self) -> usize {
    self.nodes.len()
  }

  pub fn is_empty(&self) -> bool {
    self.nodes.is_empty()
  }

  /// All install pairs of all nodes, in registration order.
  pub fn install_pairs(&self) -> Vec<&InstallPair> {
    self.nodes.iter().flat_map(|entry| entry.node.installs.iter()).collect()
  }

  /// Register every staged node in order, stopping at the first rejection.
  pub fn extend(&mut self, nodes: Vec<BuildNode>) -> Result<Vec<NodeHash>, ExecutorError> {
    nodes.into_iter().map(|node| self.register(node)).collect()
  }

  pub fn to_json(&self) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(self)
  }
}

impl Executor for BuildGraph {
  fn register(&mut self, node: BuildNode) -> Result<NodeHash, ExecutorError> {
    let hash = node.compute_hash()?;

    if let Some(output) = node.outputs.iter().find(|o| self.by_output.contains_key(*o)) {
      return Err(ExecutorError::DuplicateOutput {
        output: output.clone(),
        existing: self.by_output[output].clone(),
      });
    }

    for output in &node.outputs {
      self.by_output.insert(output.clone(), hash.clone());
    }
    self.by_hash.insert(hash.clone(), self.nodes.len());
    trace!(node = %hash, name = %node.name, "node registered");
    self.nodes.push(GraphEntry {
      hash: hash.clone(),
      node,
    });

    Ok(hash)
  }
}
