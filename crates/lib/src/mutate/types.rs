use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::graph::GraphError;

/// Errors raised by a mutation pass.
#[derive(Debug, Error)]
pub enum MutateError {
  #[error(transparent)]
  Graph(#[from] GraphError),

  /// A policy returned no variations for a module.
  #[error("policy for axis {axis} returned no variations for module {module}")]
  EmptyVariations { axis: String, module: String },

  /// A policy returned the same variation twice for a module.
  #[error("policy for axis {axis} returned variation {variation:?} twice for module {module}")]
  DuplicateVariation {
    axis: String,
    module: String,
    variation: String,
  },

  #[error("failed to start mutation thread pool: {0}")]
  ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Which variant of a dependency an edge resolves to when the depender
/// carries no matching value on the axis.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefaultVariation {
  /// The first variation the dependency's policy listed.
  #[default]
  First,

  /// The variation with this value.
  Named(String),

  /// No fallback; an unmatched edge is an error.
  Strict,
}

/// Configuration for the mutation engine.
#[derive(Debug, Clone)]
pub struct MutateConfig {
  /// Size of the worker pool evaluating one wave.
  pub parallelism: usize,

  /// Replaces every policy's own default when set.
  pub default_variation: Option<DefaultVariation>,
}

impl Default for MutateConfig {
  fn default() -> Self {
    Self {
      parallelism: num_cpus(),
      default_variation: None,
    }
  }
}

pub(crate) fn num_cpus() -> usize {
  std::thread::available_parallelism().map(|p| p.get()).unwrap_or(4)
}

/// Outcome of one mutation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationStats {
  pub axis: String,

  /// Variants that were cloned into two or more variants.
  pub split: usize,

  /// Variants whose policy returned a single variation.
  pub passthrough: usize,

  /// Variants whose kind has no policy on this axis.
  pub untouched: usize,
}

impl MutationStats {
  pub fn total(&self) -> usize {
    self.split + self.passthrough + self.untouched
  }
}
