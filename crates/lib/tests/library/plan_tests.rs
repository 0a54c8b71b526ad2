use std::io::Write;

use modgraph_lib::graph::ModuleDefs;
use modgraph_lib::{PlanConfig, plan};

use super::common::DEVICE_JSON;

fn device_defs() -> ModuleDefs {
  let mut file = tempfile::NamedTempFile::new().unwrap();
  file.write_all(DEVICE_JSON.as_bytes()).unwrap();
  ModuleDefs::from_file(file.path()).unwrap()
}

fn config(coverage: bool) -> PlanConfig {
  PlanConfig {
    parallelism: 4,
    native_coverage: coverage,
    coverage_paths: vec!["external/".to_string()],
    ..Default::default()
  }
}

#[test]
fn device_plan_without_coverage() {
  let plan = plan(&device_defs(), &config(false)).unwrap();

  assert_eq!(plan.variants.len(), 7);
  assert!(plan.variants.variants().iter().all(|v| !v.mutated.link_coverage));

  let commands: Vec<&str> = plan.build_graph.nodes().map(|e| e.node.command.as_str()).collect();
  assert_eq!(
    commands,
    vec![
      "cp -f device/acme/fstab.acme out/.intermediates/fstab.device/core/fstab.device",
      "cp -f device/acme/fstab.acme out/.intermediates/fstab.device/recovery/fstab.device",
      "cp -f device/acme/init.recovery.acme.rc out/.intermediates/init.recovery.rc/recovery/init.recovery.rc",
    ]
  );

  let installs: Vec<String> = plan.build_graph.install_pairs().iter().map(|p| p.to.to_string()).collect();
  assert_eq!(
    installs,
    vec![
      "/system/etc/fstab.device",
      "/recovery/root/system/etc/fstab.device",
      "/recovery/root/system/etc/init/init.recovery.rc",
    ]
  );
}

#[test]
fn recovery_only_module_depends_on_recovery_variant() {
  let plan = plan(&device_defs(), &config(false)).unwrap();
  let graph = &plan.variants;

  assert!(graph.variant("init.recovery.rc", "core").is_none());
  let init = graph.variant("init.recovery.rc", "recovery").unwrap();
  assert_eq!(graph[init.deps[0].target].label(), "fstab.device:recovery");
}

#[test]
fn device_plan_with_coverage() {
  let plan = plan(&device_defs(), &config(true)).unwrap();
  let graph = &plan.variants;

  assert_eq!(graph.len(), 9);

  // Instrumented only under the configured prefix.
  assert!(graph.variant("libz", "cov").unwrap().mutated.coverage_enabled);
  let toybox = graph.variant("toybox", "cov").unwrap();
  assert!(toybox.mutated.is_coverage_variant);
  assert!(!toybox.mutated.coverage_enabled);

  // Opted out and too-old modules are not split.
  assert_eq!(graph.variants_of("libcrypto").len(), 1);
  assert_eq!(graph.variants_of("libold").len(), 1);

  // The instrumented binary links the runtime through its static dependency.
  assert!(toybox.mutated.link_coverage);
  assert!(!graph.variant("toybox", "").unwrap().mutated.link_coverage);
  assert!(!graph.variant("libcrypto", "").unwrap().mutated.link_coverage);

  let image = &plan.stats[0];
  assert_eq!((image.split, image.passthrough, image.untouched), (1, 1, 4));
  let coverage = &plan.stats[1];
  assert_eq!((coverage.split, coverage.passthrough, coverage.untouched), (2, 2, 3));

  // Native modules contribute no rules.
  assert_eq!(plan.build_graph.len(), 3);
}

#[test]
fn plan_is_deterministic() {
  let defs = device_defs();
  let first = plan(&defs, &config(true)).unwrap().to_json().unwrap();
  for _ in 0..4 {
    assert_eq!(plan(&defs, &config(true)).unwrap().to_json().unwrap(), first);
  }
}
