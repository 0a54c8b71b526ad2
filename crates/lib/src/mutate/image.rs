//! Image placement: decides whether a module is built for the core system
//! image, the recovery image, or both.

use crate::consts::{CORE_VARIATION, RECOVERY_VARIATION};
use crate::graph::{ModuleProps, Variant};

use super::policy::{PatchContext, PolicyContext, VariationPolicy};

/// Splits modules into `core` and `recovery` variants.
///
/// - `install_in_recovery` builds only the `recovery` variant
/// - `recovery_available` builds both
/// - anything else builds only `core`
///
/// The `recovery` clone is marked [`in_recovery`](crate::graph::MutatedProps::in_recovery).
/// Dependers without a matching image fall back to the first listed variant.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImagePlacementPolicy;

impl ImagePlacementPolicy {
  pub fn images(props: &ModuleProps) -> Vec<String> {
    let core = !props.install_in_recovery;
    let recovery = props.recovery_available || props.install_in_recovery;

    let mut images = Vec::with_capacity(2);
    if core {
      images.push(CORE_VARIATION.to_string());
    }
    if recovery {
      images.push(RECOVERY_VARIATION.to_string());
    }
    images
  }
}

impl VariationPolicy for ImagePlacementPolicy {
  fn variations(&self, ctx: &PolicyContext<'_>) -> Vec<String> {
    Self::images(&ctx.variant().props)
  }

  fn patch(&self, ctx: &PatchContext<'_>, variant: &mut Variant) {
    variant.mutated.in_recovery = ctx.variation() == RECOVERY_VARIATION;
  }
}
