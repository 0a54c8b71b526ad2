//! Native code coverage.
//!
//! [`CoveragePolicy`] splits opted-in native modules into a plain variant and
//! an instrumented one. [`propagate_link_coverage`] then runs as a separate
//! pass over the mutated graph to decide which linked artifacts must pull in
//! the coverage runtime.

use tracing::debug;

use crate::consts::{COVERAGE_VARIATION, MIN_COVERAGE_SDK_VERSION};
use crate::graph::{DependencyTag, GraphError, LinkKind, ModuleDag, ModuleProps, Variant, VariantGraph};

use super::policy::{PatchContext, PolicyContext, VariationPolicy};

/// Linker flags for a variant that links the coverage runtime.
pub const COVERAGE_LINK_FLAGS: &[&str] = &["--coverage"];

/// Splits native modules into `""` and `cov` variants.
///
/// The `""` half of a split is hidden and never installed; the `cov` half is
/// the one the coverage build ships. The `cov` half is only actually compiled
/// with instrumentation when its directory falls under one of the configured
/// path prefixes.
#[derive(Debug, Clone, Default)]
pub struct CoveragePolicy {
  enabled: bool,
  paths: Vec<String>,
}

impl CoveragePolicy {
  /// `enabled` is the global switch; `paths` are directory prefixes, with an
  /// empty list meaning every directory.
  pub fn new(enabled: bool, paths: Vec<String>) -> Self {
    Self { enabled, paths }
  }

  /// Whether a module needs the instrumented variant at all.
  pub fn needs_variant(&self, props: &ModuleProps) -> bool {
    self.enabled && !props.host && !props.stubs && props.native_coverage.unwrap_or(true) && sdk_allows(props)
  }

  /// Whether modules under `dir` are compiled with instrumentation.
  pub fn enabled_for_path(&self, dir: &str) -> bool {
    self.paths.is_empty() || self.paths.iter().any(|prefix| dir.starts_with(prefix.as_str()))
  }
}

/// `current`, absent and unparsable versions pass; numeric levels below the
/// minimum do not.
fn sdk_allows(props: &ModuleProps) -> bool {
  match props.sdk_version.as_deref() {
    None | Some("current") => true,
    Some(version) => version
      .parse::<i64>()
      .map_or(true, |level| level >= MIN_COVERAGE_SDK_VERSION),
  }
}

impl VariationPolicy for CoveragePolicy {
  fn variations(&self, ctx: &PolicyContext<'_>) -> Vec<String> {
    if self.needs_variant(&ctx.variant().props) {
      vec![String::new(), COVERAGE_VARIATION.to_string()]
    } else {
      vec![String::new()]
    }
  }

  fn patch(&self, ctx: &PatchContext<'_>, variant: &mut Variant) {
    if !ctx.is_split() {
      return;
    }

    if ctx.variation() == COVERAGE_VARIATION {
      variant.mutated.is_coverage_variant = true;
      variant.mutated.coverage_enabled = self.enabled_for_path(&variant.dir);
    } else {
      variant.mutated.coverage_enabled = false;
      variant.mutated.is_coverage_variant = false;
      variant.mutated.hidden = true;
      variant.mutated.prevent_install = true;
    }
  }
}

/// Decide `link_coverage` for every variant.
///
/// A variant links the coverage runtime when it was compiled with coverage,
/// or when instrumented objects reach it: through whole-static edges for a
/// static library, or through any direct static-library dependency for a
/// binary or shared library.
pub fn propagate_link_coverage(graph: &mut VariantGraph) -> Result<usize, GraphError> {
  let order = ModuleDag::from_variants(graph)?.topological();
  let mut linked = 0;

  for id in order {
    let variant = &graph[id];
    let link_coverage = match variant.props.link {
      LinkKind::None => false,
      link => {
        variant.mutated.coverage_enabled
          || variant.deps.iter().any(|dep| {
            let target = &graph[dep.target];
            target.mutated.link_coverage
              && if link.is_static_library() {
                dep.tag == DependencyTag::WholeStatic
              } else {
                target.props.link.is_static_library()
              }
          })
      }
    };

    if link_coverage {
      linked += 1;
    }
    graph.variant_mut(id).mutated.link_coverage = link_coverage;
  }

  debug!(linked, "link coverage propagated");
  Ok(linked)
}

/// Extra linker flags a variant needs for coverage.
pub fn link_flags(variant: &Variant) -> &'static [&'static str] {
  if variant.mutated.link_coverage {
    COVERAGE_LINK_FLAGS
  } else {
    &[]
  }
}
