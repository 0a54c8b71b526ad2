//! Module kinds.
//!
//! Each module kind contributes mutation policies to the engine and turns
//! every finished variant of its modules into build rules. The
//! [`ModuleRegistry`] maps kind names to their [`ActionGenerator`].

mod cc;
mod prebuilt_etc;

use std::collections::BTreeMap;
use std::sync::Arc;

use thiserror::Error;

use crate::consts::{COVERAGE_AXIS, IMAGE_AXIS};
use crate::executor::Executor;
use crate::graph::{DependencyTag, Variant, VariantGraph};
use crate::mutate::{MutationEngine, VariationPolicy};
use crate::path::{BuildPath, PathContext, PathError};
use crate::plan::PlanConfig;
use crate::rule::RuleError;

pub use cc::{CC_KINDS, CcModule};
pub use prebuilt_etc::PrebuiltEtc;

/// Errors raised while generating a module's build rules.
#[derive(Debug, Error)]
pub enum ModuleError {
  #[error("module {module}: missing required property {property}")]
  MissingProperty { module: String, property: &'static str },

  #[error("module {module}: {property} cannot be set together with {conflicts_with}")]
  ConflictingProperties {
    module: String,
    property: &'static str,
    conflicts_with: &'static str,
  },

  #[error("module {module} has unknown kind {kind}")]
  UnknownKind { module: String, kind: String },

  #[error("module {module}: {source}")]
  Path {
    module: String,
    #[source]
    source: PathError,
  },

  #[error("module {module}: {source}")]
  Rule {
    module: String,
    #[source]
    source: RuleError,
  },
}

/// What a generator sees of the variant it is generating rules for.
pub struct ModuleContext<'a> {
  pub variant: &'a Variant,
  pub graph: &'a VariantGraph,
  pub paths: &'a PathContext,
}

impl<'a> ModuleContext<'a> {
  pub fn module(&self) -> &str {
    &self.variant.module
  }

  /// The resolved dependencies of this variant with their edge tags.
  pub fn dependencies(&self) -> impl Iterator<Item = (&'a Variant, &'a DependencyTag)> {
    self.graph.dependencies(self.variant.id)
  }

  /// A file in the module's directory.
  pub fn source(&self, rel: &str) -> Result<BuildPath, ModuleError> {
    let joined = if self.variant.dir.is_empty() {
      rel.to_string()
    } else {
      format!("{}/{}", self.variant.dir, rel)
    };
    self.paths.source(&joined).map_err(|e| self.path_error(e))
  }

  /// A file private to this variant under the intermediates directory.
  pub fn module_out(&self, rel: &str) -> Result<BuildPath, ModuleError> {
    self
      .paths
      .module_out(&self.variant.module, &self.variant.name(), rel)
      .map_err(|e| self.path_error(e))
  }

  /// A destination on the target image.
  pub fn install(&self, rel: &str) -> Result<BuildPath, ModuleError> {
    self.paths.install(rel).map_err(|e| self.path_error(e))
  }

  pub fn path_error(&self, source: PathError) -> ModuleError {
    ModuleError::Path {
      module: self.variant.module.clone(),
      source,
    }
  }

  pub fn rule_error(&self, source: RuleError) -> ModuleError {
    ModuleError::Rule {
      module: self.variant.module.clone(),
      source,
    }
  }
}

/// Behavior of one module kind.
pub trait ActionGenerator: Send + Sync {
  /// Mutation policies for this kind, as `(axis, policy)` pairs.
  fn policies(&self, config: &PlanConfig) -> Vec<(&'static str, Arc<dyn VariationPolicy>)>;

  /// Register the build rules of one finished variant.
  fn generate(&self, ctx: &ModuleContext<'_>, executor: &mut dyn Executor) -> Result<(), ModuleError>;
}

/// Known module kinds.
#[derive(Clone, Default)]
pub struct ModuleRegistry {
  generators: BTreeMap<String, Arc<dyn ActionGenerator>>,
}

impl ModuleRegistry {
  /// An empty registry.
  pub fn new() -> Self {
    Self::default()
  }

  /// A registry with every built-in kind.
  pub fn builtin() -> Self {
    let mut registry = Self::new();
    registry.register("prebuilt_etc", PrebuiltEtc);
    for kind in CC_KINDS {
      registry.register(kind, CcModule);
    }
    registry
  }

  pub fn register(&mut self, kind: &str, generator: impl ActionGenerator + 'static) -> &mut Self {
    self.generators.insert(kind.to_string(), Arc::new(generator));
    self
  }

  pub fn get(&self, kind: &str) -> Option<&dyn ActionGenerator> {
    self.generators.get(kind).map(|g| g.as_ref())
  }

  pub fn kinds(&self) -> impl Iterator<Item = &str> {
    self.generators.keys().map(String::as_str)
  }

  /// Register every kind's policies. Image placement always runs before
  /// coverage, whatever the kind order.
  pub fn register_policies(&self, engine: &mut MutationEngine, config: &PlanConfig) {
    engine.declare_axis(IMAGE_AXIS).declare_axis(COVERAGE_AXIS);
    for (kind, generator) in &self.generators {
      for (axis, policy) in generator.policies(config) {
        engine.register_shared(axis, kind, policy);
      }
    }
  }

  /// Generate the rules of one variant.
  pub fn generate(&self, ctx: &ModuleContext<'_>, executor: &mut dyn Executor) -> Result<(), ModuleError> {
    let generator = self.get(&ctx.variant.kind).ok_or_else(|| ModuleError::UnknownKind {
      module: ctx.variant.module.clone(),
      kind: ctx.variant.kind.clone(),
    })?;
    generator.generate(ctx, executor)
  }
}

impl std::fmt::Debug for ModuleRegistry {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("ModuleRegistry")
      .field("kinds", &self.generators.keys().collect::<Vec<_>>())
      .finish()
  }
}
