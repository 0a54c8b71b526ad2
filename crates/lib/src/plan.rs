//! Planning pipeline: module definitions in, build graph out.
//!
//! 1. Build the initial variant graph and reject cycles.
//! 2. Run the mutation passes (image placement, then coverage).
//! 3. Propagate link coverage when coverage is enabled.
//! 4. Generate every variant's rules concurrently into private staging
//!    buffers, then register them into one [`BuildGraph`] in declaration
//!    order.

use std::env;

use rayon::ThreadPoolBuilder;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::consts::{DEFAULT_OUT_DIR, ENV_COVERAGE_PATHS, ENV_NATIVE_COVERAGE, ENV_OUT_DIR, ENV_PARALLELISM};
use crate::executor::{BuildGraph, BuildNode, ExecutorError};
use crate::graph::{GraphError, ModuleDag, ModuleDefs, VariantGraph};
use crate::modules::{ModuleContext, ModuleError, ModuleRegistry};
use crate::mutate::coverage::propagate_link_coverage;
use crate::mutate::{DefaultVariation, MutateConfig, MutateError, MutationEngine, MutationStats};
use crate::path::{PathContext, PathError};
use crate::util::set::first_unique;

/// Errors that abort planning.
#[derive(Debug, Error)]
pub enum PlanError {
  /// An environment override could not be parsed.
  #[error("invalid value {value:?} for {var}: expected {expected}")]
  Config {
    var: &'static str,
    value: String,
    expected: &'static str,
  },

  #[error("invalid output directory: {0}")]
  Path(#[from] PathError),

  #[error(transparent)]
  Graph(#[from] GraphError),

  #[error(transparent)]
  Mutate(#[from] MutateError),

  #[error(transparent)]
  Module(#[from] ModuleError),

  #[error(transparent)]
  Executor(#[from] ExecutorError),

  #[error("failed to start generation thread pool: {0}")]
  ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Configuration for one planning run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanConfig {
  /// Build-output root.
  pub out_dir: String,

  /// Worker-pool size for mutation and rule generation.
  pub parallelism: usize,

  /// Global native-coverage switch.
  pub native_coverage: bool,

  /// Directory prefixes whose instrumented variants are actually compiled
  /// with coverage. Empty means every directory.
  pub coverage_paths: Vec<String>,

  /// Overrides every policy's fallback variation when set.
  pub default_variation: Option<DefaultVariation>,
}

impl Default for PlanConfig {
  fn default() -> Self {
    let mutate = MutateConfig::default();
    Self {
      out_dir: DEFAULT_OUT_DIR.to_string(),
      parallelism: mutate.parallelism,
      native_coverage: false,
      coverage_paths: Vec::new(),
      default_variation: mutate.default_variation,
    }
  }
}

impl PlanConfig {
  /// Defaults with `MODGRAPH_*` environment overrides applied.
  pub fn from_env() -> Result<Self, PlanError> {
    let mut config = Self::default();

    if let Ok(out_dir) = env::var(ENV_OUT_DIR) {
      config.out_dir = out_dir;
    }

    if let Ok(value) = env::var(ENV_PARALLELISM) {
      config.parallelism = match value.trim().parse::<usize>() {
        Ok(n) if n > 0 => n,
        _ => {
          return Err(PlanError::Config {
            var: ENV_PARALLELISM,
            value,
            expected: "a positive integer",
          });
        }
      };
    }

    if let Ok(value) = env::var(ENV_NATIVE_COVERAGE) {
      config.native_coverage = match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" => true,
        "" | "0" | "false" => false,
        _ => {
          return Err(PlanError::Config {
            var: ENV_NATIVE_COVERAGE,
            value,
            expected: "1, true, 0 or false",
          });
        }
      };
    }

    if let Ok(value) = env::var(ENV_COVERAGE_PATHS) {
      config.coverage_paths = split_list(&value);
    }

    Ok(config)
  }

  pub fn mutate_config(&self) -> MutateConfig {
    MutateConfig {
      parallelism: self.parallelism,
      default_variation: self.default_variation.clone(),
    }
  }
}

fn split_list(value: &str) -> Vec<String> {
  first_unique(
    value
      .split(',')
      .map(str::trim)
      .filter(|s| !s.is_empty())
      .map(String::from),
  )
}

/// The outcome of planning.
#[derive(Debug, Serialize)]
pub struct Plan {
  /// The fully mutated variant graph.
  pub variants: VariantGraph,

  /// Every generated rule, in declaration order of its module.
  pub build_graph: BuildGraph,

  /// One entry per mutation pass.
  pub stats: Vec<MutationStats>,
}

impl Plan {
  pub fn to_json(&self) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(self)
  }
}

/// Plan with the built-in module kinds.
pub fn plan(defs: &ModuleDefs, config: &PlanConfig) -> Result<Plan, PlanError> {
  plan_with(defs, config, &ModuleRegistry::builtin())
}

/// Plan with a caller-provided set of module kinds.
pub fn plan_with(defs: &ModuleDefs, config: &PlanConfig, registry: &ModuleRegistry) -> Result<Plan, PlanError> {
  info!(modules = defs.len(), coverage = config.native_coverage, "planning");

  let paths = PathContext::new(&config.out_dir)?;
  let graph = VariantGraph::from_defs(defs)?;
  ModuleDag::from_variants(&graph)?;

  let mut engine = MutationEngine::new(config.mutate_config());
  registry.register_policies(&mut engine, config);
  let (mut graph, stats) = engine.run(graph)?;

  if config.native_coverage {
    propagate_link_coverage(&mut graph)?;
  }

  let pool = ThreadPoolBuilder::new()
    .num_threads(config.parallelism)
    .thread_name(|idx| format!("modgraph-generate-{}", idx))
    .build()?;

  let staged: Vec<Result<Vec<BuildNode>, ModuleError>> = pool.install(|| {
    graph
      .variants()
      .par_iter()
      .map(|variant| {
        let ctx = ModuleContext {
          variant,
          graph: &graph,
          paths: &paths,
        };
        let mut nodes: Vec<BuildNode> = Vec::new();
        registry.generate(&ctx, &mut nodes)?;
        Ok(nodes)
      })
      .collect()
  });

  let mut build_graph = BuildGraph::new();
  for (variant, nodes) in graph.variants().iter().zip(staged) {
    let nodes = nodes?;
    debug!(variant = %variant.label(), nodes = nodes.len(), "merging staged rules");
    build_graph.extend(nodes)?;
  }

  info!(variants = graph.len(), nodes = build_graph.len(), "plan complete");

  Ok(Plan {
    variants: graph,
    build_graph,
    stats,
  })
}
