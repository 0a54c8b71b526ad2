//! Implementation of the `modgraph variants` command.

use std::path::Path;

use anyhow::Result;
use owo_colors::{OwoColorize, Stream};

use modgraph_lib::graph::Variant;

use crate::GlobalArgs;
use crate::output::{format_flags, symbols};

pub fn cmd_variants(file: &Path, global: &GlobalArgs) -> Result<()> {
  let plan = super::load_plan(file, global)?;

  for variant in plan.variants.variants() {
    let key = variant.name();
    let key = if key.is_empty() { "-".to_string() } else { key };
    println!(
      "{} {} {} {}",
      variant.module,
      key.if_supports_color(Stream::Stdout, |s| s.cyan()),
      format_flags(&flags(variant)).if_supports_color(Stream::Stdout, |s| s.dimmed()),
      deps(&plan.variants, variant)
    );
  }

  Ok(())
}

fn flags(variant: &Variant) -> Vec<&'static str> {
  let m = &variant.mutated;
  [
    (m.in_recovery, "recovery"),
    (m.is_coverage_variant, "cov-variant"),
    (m.coverage_enabled, "coverage"),
    (m.link_coverage, "link-coverage"),
    (m.hidden, "hidden"),
    (!variant.installable(), "no-install"),
  ]
  .into_iter()
  .filter_map(|(set, name)| set.then_some(name))
  .collect()
}

fn deps(graph: &modgraph_lib::graph::VariantGraph, variant: &Variant) -> String {
  let targets: Vec<String> = graph.dependencies(variant.id).map(|(dep, _)| dep.label()).collect();
  if targets.is_empty() {
    String::new()
  } else {
    format!("{} {}", symbols::ARROW, targets.join(" "))
  }
}
