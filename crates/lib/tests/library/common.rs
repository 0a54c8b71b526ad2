use modgraph_lib::graph::{Dependency, ModuleDef, ModuleDefs, VariantGraph};
use modgraph_lib::path::{BuildPath, PathContext};

pub fn ctx() -> PathContext {
  PathContext::new("out").unwrap()
}

pub fn source(rel: &str) -> BuildPath {
  ctx().source(rel).unwrap()
}

pub fn output(rel: &str) -> BuildPath {
  ctx().output(rel).unwrap()
}

pub fn rendered(paths: &[BuildPath]) -> Vec<String> {
  paths.iter().map(|p| p.to_string()).collect()
}

/// A graph of `kind` modules; each entry is a name and the names it depends on.
pub fn graph_of(kind: &str, modules: &[(&str, &[&str])]) -> VariantGraph {
  let defs = ModuleDefs::new(
    modules
      .iter()
      .map(|(name, deps)| ModuleDef::new(*name, kind).with_deps(deps.iter().map(|d| Dependency::new(*d))))
      .collect(),
  );
  VariantGraph::from_defs(&defs).unwrap()
}

/// A small device tree exercising both built-in passes.
pub const DEVICE_JSON: &str = r#"{
  "modules": [
    {
      "name": "fstab.device",
      "kind": "prebuilt_etc",
      "dir": "device/acme",
      "props": { "src": "fstab.acme", "recovery_available": true }
    },
    {
      "name": "init.recovery.rc",
      "kind": "prebuilt_etc",
      "dir": "device/acme",
      "deps": [{ "name": "fstab.device" }],
      "props": { "src": "init.recovery.acme.rc", "install_in_recovery": true, "sub_dir": "init" }
    },
    {
      "name": "libz",
      "kind": "cc_library_static",
      "dir": "external/zlib",
      "props": { "link": "static_library" }
    },
    {
      "name": "libcrypto",
      "kind": "cc_library_static",
      "dir": "external/boringssl",
      "deps": [{ "name": "libz", "tag": "whole_static" }],
      "props": { "link": "static_library", "native_coverage": false }
    },
    {
      "name": "toybox",
      "kind": "cc_binary",
      "dir": "system/core/toybox",
      "deps": [
        { "name": "libcrypto", "tag": "static" },
        { "name": "libz", "tag": "static" }
      ],
      "props": { "link": "binary" }
    },
    {
      "name": "libold",
      "kind": "cc_library_shared",
      "dir": "vendor/old",
      "props": { "link": "shared_library", "sdk_version": "21" }
    }
  ]
}"#;
