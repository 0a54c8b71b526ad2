use std::path::PathBuf;

use thiserror::Error;

/// Errors in the structure of the module graph.
///
/// All of these abort the build before any action is generated.
#[derive(Debug, Error)]
pub enum GraphError {
  /// Two modules share a name.
  #[error("module {module} is defined more than once")]
  DuplicateModule { module: String },

  /// An edge points at a module that does not exist.
  #[error("module {module} depends on undefined module {dependency}")]
  MissingDependency { module: String, dependency: String },

  /// The dependency graph has a cycle through `module`.
  #[error("dependency cycle detected through module {module}")]
  Cycle { module: String },

  /// No variant of the dependency is compatible with the depender and no
  /// default applies.
  #[error("{from} -> {to}: no variant matches {axis}={wanted:?} and no default applies")]
  NoMatchingVariant {
    from: String,
    to: String,
    axis: String,
    wanted: Option<String>,
  },

  /// The module definition document could not be read.
  #[error("failed to read module definitions from {}: {source}", path.display())]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  /// The module definition document is not valid.
  #[error("invalid module definitions: {0}")]
  Parse(#[from] serde_json::Error),
}
