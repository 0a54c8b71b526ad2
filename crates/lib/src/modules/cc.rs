//! Native (C-family) module kinds.
//!
//! Compilation itself happens elsewhere; here these kinds only take part in
//! variant splitting and link-coverage propagation.

use std::sync::Arc;

use tracing::trace;

use crate::consts::COVERAGE_AXIS;
use crate::executor::Executor;
use crate::mutate::VariationPolicy;
use crate::mutate::coverage::{CoveragePolicy, link_flags};
use crate::plan::PlanConfig;

use super::{ActionGenerator, ModuleContext, ModuleError};

pub const CC_KINDS: [&str; 4] = ["cc_library_static", "cc_library_shared", "cc_library", "cc_binary"];

#[derive(Debug, Clone, Copy, Default)]
pub struct CcModule;

impl CcModule {
  /// Static libraries a final linked artifact pulls in, by label. Empty for
  /// kinds that do not link.
  pub fn static_link_inputs(ctx: &ModuleContext<'_>) -> Vec<String> {
    if !ctx.variant.props.link.is_linked() {
      return Vec::new();
    }
    ctx
      .dependencies()
      .filter(|(dep, _)| dep.props.link.is_static_library())
      .map(|(dep, _)| dep.label())
      .collect()
  }
}

impl ActionGenerator for CcModule {
  fn policies(&self, config: &PlanConfig) -> Vec<(&'static str, Arc<dyn VariationPolicy>)> {
    let policy: Arc<dyn VariationPolicy> =
      Arc::new(CoveragePolicy::new(config.native_coverage, config.coverage_paths.clone()));
    vec![(COVERAGE_AXIS, policy)]
  }

  fn generate(&self, ctx: &ModuleContext<'_>, _executor: &mut dyn Executor) -> Result<(), ModuleError> {
    trace!(
      module = ctx.module(),
      variant = %ctx.variant.name(),
      static_libs = ?Self::static_link_inputs(ctx),
      ldflags = ?link_flags(ctx.variant),
      "native module has no build rules"
    );
    Ok(())
  }
}
