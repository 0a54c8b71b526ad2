//! Implementation of the `modgraph graph` command.
//!
//! Writes the build graph document handed to the downstream executor.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use crate::GlobalArgs;
use crate::output::{print_json, print_success};

pub fn cmd_graph(file: &Path, global: &GlobalArgs, output: Option<&Path>) -> Result<()> {
  let plan = super::load_plan(file, global)?;

  match output {
    Some(path) => {
      let json = plan.build_graph.to_json().context("Failed to serialize build graph")?;
      if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
      {
        fs::create_dir_all(parent).with_context(|| format!("Failed to create directory: {}", parent.display()))?;
      }
      fs::write(path, json).with_context(|| format!("Failed to write build graph: {}", path.display()))?;
      info!(path = %path.display(), nodes = plan.build_graph.len(), "build graph written");
      print_success(&format!(
        "Wrote {} node(s) to {}",
        plan.build_graph.len(),
        path.display()
      ));
    }
    None => print_json(&plan.build_graph)?,
  }

  Ok(())
}
