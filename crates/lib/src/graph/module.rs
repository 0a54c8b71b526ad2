//! Declarative module definitions.
//!
//! The definition document is produced by an upstream parser; this crate only
//! reads it. A document is a JSON object with a `modules` array:
//!
//! ```json
//! {
//!   "modules": [
//!     { "name": "libfoo", "kind": "cc_library_static", "props": { "link": "static_library" } },
//!     { "name": "foo", "kind": "cc_binary",
//!       "deps": [{ "name": "libfoo", "tag": "whole_static" }],
//!       "props": { "link": "binary", "native_coverage": true } }
//!   ]
//! }
//! ```
//!
//! Declaration order is significant: it decides variant numbering and which
//! error is reported when several modules fail in the same wave.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::types::GraphError;

/// How a dependency edge is used by the depender.
///
/// Policies and action generators may inspect the tag; the graph itself
/// treats every tag the same way.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DependencyTag {
  #[default]
  None,
  Static,
  WholeStatic,
  Shared,
  Named(String),
}

/// One outgoing edge of a module definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Dependency {
  pub name: String,

  #[serde(default)]
  pub tag: DependencyTag,
}

impl Dependency {
  pub fn new(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      tag: DependencyTag::None,
    }
  }

  pub fn tagged(name: impl Into<String>, tag: DependencyTag) -> Self {
    Self {
      name: name.into(),
      tag,
    }
  }
}

/// What a native module links into.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkKind {
  #[default]
  None,
  StaticLibrary,
  SharedLibrary,
  Binary,
  StaticBinary,
}

impl LinkKind {
  pub fn is_static_library(self) -> bool {
    self == LinkKind::StaticLibrary
  }

  /// Produces a final linked artifact.
  pub fn is_linked(self) -> bool {
    matches!(self, LinkKind::SharedLibrary | LinkKind::Binary | LinkKind::StaticBinary)
  }
}

/// Properties a module declares. Every field is optional in the document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ModuleProps {
  /// Source file, relative to the module directory.
  pub src: Option<String>,

  /// Subdirectory below the install root.
  pub sub_dir: Option<String>,

  /// Installed file name.
  pub filename: Option<String>,

  /// Take the installed file name from `src`.
  pub filename_from_src: bool,

  /// Also build a variant for the recovery image.
  pub recovery_available: bool,

  /// Build only for the recovery image.
  pub install_in_recovery: bool,

  /// `Some(false)` keeps the module out of every image.
  pub installable: Option<bool>,

  /// Per-module coverage opt-out. Absent counts as opted in; `Some(false)`
  /// keeps the module from being instrumented.
  pub native_coverage: Option<bool>,

  /// Target SDK version; `current` or absent means the latest.
  pub sdk_version: Option<String>,

  /// Built for the host rather than the device.
  pub host: bool,

  /// Stub library that is never instrumented.
  pub stubs: bool,

  pub link: LinkKind,
}

/// A module as declared by the upstream parser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModuleDef {
  pub name: String,

  /// Module type; selects the mutators and the action generator.
  pub kind: String,

  /// Directory of the declaring build file, relative to the source root.
  #[serde(default)]
  pub dir: String,

  #[serde(default)]
  pub deps: Vec<Dependency>,

  #[serde(default)]
  pub props: ModuleProps,
}

impl ModuleDef {
  pub fn new(name: impl Into<String>, kind: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      kind: kind.into(),
      dir: String::new(),
      deps: Vec::new(),
      props: ModuleProps::default(),
    }
  }

  pub fn with_deps(mut self, deps: impl IntoIterator<Item = Dependency>) -> Self {
    self.deps.extend(deps);
    self
  }

  pub fn with_props(mut self, props: ModuleProps) -> Self {
    self.props = props;
    self
  }

  pub fn in_dir(mut self, dir: impl Into<String>) -> Self {
    self.dir = dir.into();
    self
  }
}

/// All module definitions, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModuleDefs {
  pub modules: Vec<ModuleDef>,
}

impl ModuleDefs {
  pub fn new(modules: Vec<ModuleDef>) -> Self {
    Self { modules }
  }

  pub fn from_json_str(json: &str) -> Result<Self, GraphError> {
    Ok(serde_json::from_str(json)?)
  }

  pub fn from_file(path: &Path) -> Result<Self, GraphError> {
    let content = std::fs::read_to_string(path).map_err(|source| GraphError::Read {
      path: path.to_path_buf(),
      source,
    })?;
    Self::from_json_str(&content)
  }

  pub fn len(&self) -> usize {
    self.modules.len()
  }

  pub fn is_empty(&self) -> bool {
    self.modules.is_empty()
  }
}
