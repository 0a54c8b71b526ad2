//! Path and identity model.
//!
//! Every file the build graph talks about is a [`BuildPath`]: a normalized,
//! slash-separated string tagged with where it comes from.
//!
//! - [`PathKind::Source`] - a file in the source tree, rendered relative to the
//!   top of the tree (`vendor/foo/bar.conf`)
//! - [`PathKind::Output`] - a generated file, rendered under the build-output
//!   root (`out/.intermediates/foo/core/bar.conf`)
//! - [`PathKind::Install`] - a destination on the target image
//!   (`/system/etc/bar.conf`)
//!
//! Paths are immutable values. Two paths are equal only when both their
//! rendered strings and their kinds are equal; ordering is by rendered string
//! in code-point order, so `Tool` sorts before `input`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::{DEFAULT_OUT_DIR, INTERMEDIATES_DIR};

/// Where a path comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathKind {
  Source,
  Output,
  Install,
}

/// Errors that can occur while resolving a path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
  #[error("empty {0:?} path")]
  Empty(PathKind),

  #[error("{kind:?} path must be relative: {path}")]
  Absolute { kind: PathKind, path: String },

  #[error("{kind:?} path escapes its root: {path}")]
  EscapesRoot { kind: PathKind, path: String },
}

/// A normalized, provenance-tagged path.
///
/// Field order matters: the derived ordering compares the rendered string
/// first and only falls back to the kind for otherwise identical strings.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BuildPath {
  path: String,
  kind: PathKind,
}

impl BuildPath {
  /// The rendered, normalized string.
  pub fn as_str(&self) -> &str {
    &self.path
  }

  pub fn kind(&self) -> PathKind {
    self.kind
  }

  /// Final path component.
  pub fn base(&self) -> &str {
    self.path.rsplit('/').next().unwrap_or(&self.path)
  }
}

impl std::fmt::Display for BuildPath {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(&self.path)
  }
}

impl AsRef<str> for BuildPath {
  fn as_ref(&self) -> &str {
    &self.path
  }
}

/// Normalize a slash-separated relative path.
///
/// Empty and `.` segments are dropped and `..` segments consume the previous
/// segment. The result never starts or ends with `/`.
pub fn normalize(kind: PathKind, raw: &str) -> Result<String, PathError> {
  let mut segments: Vec<&str> = Vec::new();
  for segment in raw.split('/') {
    match segment {
      "" | "." => {}
      ".." => {
        if segments.pop().is_none() {
          return Err(PathError::EscapesRoot {
            kind,
            path: raw.to_string(),
          });
        }
      }
      other => segments.push(other),
    }
  }

  if segments.is_empty() {
    return Err(PathError::Empty(kind));
  }

  Ok(segments.join("/"))
}

/// Resolves logical source, output and install names into [`BuildPath`]s.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathContext {
  out_dir: String,
}

impl Default for PathContext {
  fn default() -> Self {
    Self {
      out_dir: DEFAULT_OUT_DIR.to_string(),
    }
  }
}

impl PathContext {
  /// Create a context rooting generated files under `out_dir`.
  ///
  /// The output root may be absolute; everything resolved against it stays
  /// relative to it.
  pub fn new(out_dir: &str) -> Result<Self, PathError> {
    let normalized = normalize(PathKind::Output, out_dir)?;
    let out_dir = if out_dir.starts_with('/') {
      format!("/{}", normalized)
    } else {
      normalized
    };
    Ok(Self { out_dir })
  }

  pub fn out_dir(&self) -> &str {
    &self.out_dir
  }

  /// A file in the source tree.
  pub fn source(&self, rel: &str) -> Result<BuildPath, PathError> {
    Ok(BuildPath {
      path: relative(PathKind::Source, rel)?,
      kind: PathKind::Source,
    })
  }

  /// A generated file directly under the output root.
  pub fn output(&self, rel: &str) -> Result<BuildPath, PathError> {
    let rel = relative(PathKind::Output, rel)?;
    Ok(BuildPath {
      path: format!("{}/{}", self.out_dir, rel),
      kind: PathKind::Output,
    })
  }

  /// A generated file private to one variant of one module.
  ///
  /// Renders as `<out>/.intermediates/<module>/<variant>/<rel>`; the variant
  /// segment is left out for the empty variant key.
  pub fn module_out(&self, module: &str, variant: &str, rel: &str) -> Result<BuildPath, PathError> {
    let joined = if variant.is_empty() {
      format!("{}/{}/{}", INTERMEDIATES_DIR, module, rel)
    } else {
      format!("{}/{}/{}/{}", INTERMEDIATES_DIR, module, variant, rel)
    };
    self.output(&joined)
  }

  /// A destination on the target image. Leading slashes are accepted.
  pub fn install(&self, rel: &str) -> Result<BuildPath, PathError> {
    Ok(BuildPath {
      path: format!("/{}", normalize(PathKind::Install, rel)?),
      kind: PathKind::Install,
    })
  }
}

fn relative(kind: PathKind, rel: &str) -> Result<String, PathError> {
  if rel.starts_with('/') {
    return Err(PathError::Absolute {
      kind,
      path: rel.to_string(),
    });
  }
  normalize(kind, rel)
}
