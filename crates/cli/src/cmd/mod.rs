mod graph;
mod plan;
mod variants;

pub use graph::cmd_graph;
pub use plan::cmd_plan;
pub use variants::cmd_variants;

use std::path::Path;

use anyhow::{Context, Result, bail};
use tracing::debug;

use modgraph_lib::graph::ModuleDefs;
use modgraph_lib::{Plan, PlanConfig, plan as run_plan};

use crate::GlobalArgs;

/// Environment configuration with command line flags layered on top.
fn load_config(global: &GlobalArgs) -> Result<PlanConfig> {
  let mut config = PlanConfig::from_env().context("Failed to read configuration from environment")?;

  if let Some(out_dir) = &global.out_dir {
    config.out_dir = out_dir.clone();
  }
  if let Some(jobs) = global.jobs {
    if jobs == 0 {
      bail!("--jobs must be at least 1");
    }
    config.parallelism = jobs;
  }
  if global.coverage {
    config.native_coverage = true;
  }
  if !global.coverage_paths.is_empty() {
    config.coverage_paths = global.coverage_paths.clone();
  }

  Ok(config)
}

/// Read `file` and run the planning pipeline over it.
fn load_plan(file: &Path, global: &GlobalArgs) -> Result<Plan> {
  let config = load_config(global)?;
  debug!(?config, "configuration loaded");

  let defs =
    ModuleDefs::from_file(file).with_context(|| format!("Failed to load module definitions: {}", file.display()))?;
  run_plan(&defs, &config).with_context(|| format!("Failed to plan {}", file.display()))
}
