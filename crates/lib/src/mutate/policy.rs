use crate::graph::{DependencyTag, Variant};

use super::types::DefaultVariation;

/// Inputs available to a policy while it decides a module's variations.
///
/// Mutation is bottom-up, so every dependency's variant set is already
/// final when the policy runs.
pub struct PolicyContext<'a> {
  pub(crate) axis: &'a str,
  pub(crate) variant: &'a Variant,
  pub(crate) dependencies: Vec<(&'a DependencyTag, &'a [Variant])>,
}

impl<'a> PolicyContext<'a> {
  pub fn axis(&self) -> &str {
    self.axis
  }

  /// The variant being mutated, as produced by earlier passes.
  pub fn variant(&self) -> &'a Variant {
    self.variant
  }

  /// For each outgoing edge, its tag and the finalized variants of the target.
  pub fn dependencies(&self) -> &[(&'a DependencyTag, &'a [Variant])] {
    &self.dependencies
  }
}

/// Inputs available to a policy while it patches one clone.
pub struct PatchContext<'a> {
  pub(crate) axis: &'a str,
  pub(crate) variation: &'a str,
  pub(crate) variations: &'a [String],
}

impl<'a> PatchContext<'a> {
  pub fn axis(&self) -> &str {
    self.axis
  }

  /// The variation this clone represents.
  pub fn variation(&self) -> &str {
    self.variation
  }

  /// Every variation chosen for the module, in policy order.
  pub fn variations(&self) -> &[String] {
    self.variations
  }

  /// Whether the module was cloned into more than one variant.
  pub fn is_split(&self) -> bool {
    self.variations.len() > 1
  }
}

/// Decides the variations of one module kind on one axis.
///
/// Implementations are shared across the worker pool and must be pure
/// functions of their inputs.
pub trait VariationPolicy: Send + Sync {
  /// The ordered, non-empty, duplicate-free list of variations needed.
  fn variations(&self, ctx: &PolicyContext<'_>) -> Vec<String>;

  /// Set the mutated properties of one clone.
  fn patch(&self, ctx: &PatchContext<'_>, variant: &mut Variant);

  /// Fallback for dependers that carry no matching value.
  fn default_variation(&self) -> DefaultVariation {
    DefaultVariation::First
  }
}

/// A policy made of two closures.
///
/// ```
/// use modgraph_lib::mutate::{FnPolicy, VariationPolicy};
///
/// let policy = FnPolicy::new(
///   |_ctx| vec!["arm".to_string(), "x86".to_string()],
///   |_ctx, _variant| {},
/// );
/// # let _ = &policy as &dyn VariationPolicy;
/// ```
pub struct FnPolicy<V, P> {
  variations: V,
  patch: P,
  default: DefaultVariation,
}

impl<V, P> FnPolicy<V, P>
where
  V: Fn(&PolicyContext<'_>) -> Vec<String> + Send + Sync,
  P: Fn(&PatchContext<'_>, &mut Variant) + Send + Sync,
{
  pub fn new(variations: V, patch: P) -> Self {
    Self {
      variations,
      patch,
      default: DefaultVariation::First,
    }
  }

  pub fn with_default(mut self, default: DefaultVariation) -> Self {
    self.default = default;
    self
  }
}

impl<V, P> VariationPolicy for FnPolicy<V, P>
where
  V: Fn(&PolicyContext<'_>) -> Vec<String> + Send + Sync,
  P: Fn(&PatchContext<'_>, &mut Variant) + Send + Sync,
{
  fn variations(&self, ctx: &PolicyContext<'_>) -> Vec<String> {
    (self.variations)(ctx)
  }

  fn patch(&self, ctx: &PatchContext<'_>, variant: &mut Variant) {
    (self.patch)(ctx, variant)
  }

  fn default_variation(&self) -> DefaultVariation {
    self.default.clone()
  }
}
