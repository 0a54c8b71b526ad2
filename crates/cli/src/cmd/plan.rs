//! Implementation of the `modgraph plan` command.
//!
//! Runs the full pipeline and prints a summary of the resulting variants and
//! rules, or the whole plan as JSON.

use std::path::Path;

use anyhow::Result;

use crate::GlobalArgs;
use crate::output::{print_info, print_json, print_stat, print_success, print_warning};

pub fn cmd_plan(file: &Path, global: &GlobalArgs, json: bool) -> Result<()> {
  let plan = super::load_plan(file, global)?;

  if json {
    return print_json(&plan);
  }

  print_success(&format!("Planned {}", file.display()));
  print_stat("Modules", &plan.variants.modules().count().to_string());
  print_stat("Variants", &plan.variants.len().to_string());
  for pass in &plan.stats {
    print_stat(
      &format!("Axis {}", pass.axis),
      &format!(
        "{} split, {} passthrough, {} untouched",
        pass.split, pass.passthrough, pass.untouched
      ),
    );
  }
  print_stat("Rules", &plan.build_graph.len().to_string());
  print_stat("Installs", &plan.build_graph.install_pairs().len().to_string());

  if plan.build_graph.is_empty() {
    print_warning("No rules were generated");
  } else if global.verbose {
    println!();
    for entry in plan.build_graph.nodes() {
      print_info(&format!("{} {}", crate::output::truncate_hash(&entry.hash.0), entry.node.description));
    }
  }

  Ok(())
}
