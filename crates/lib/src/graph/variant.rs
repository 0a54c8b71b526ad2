//! Variants and the variant graph.
//!
//! A variant is one concrete configuration of a module. Before any mutation
//! runs, each module has exactly one variant with no variations; mutators
//! split modules into several variants and re-point every edge at a single
//! variant of its target.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::ops::Index;

use serde::{Deserialize, Serialize};

use super::module::{DependencyTag, ModuleDefs, ModuleProps};
use super::types::GraphError;

/// Dense identity of a variant within one [`VariantGraph`].
///
/// Identities are assigned in declaration order and are only meaningful for
/// the graph that produced them; every mutation pass renumbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VariantId(pub usize);

impl std::fmt::Display for VariantId {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "#{}", self.0)
  }
}

/// One axis-value pair assigned by a mutator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Variation {
  pub axis: String,
  pub value: String,
}

/// Flags computed by mutators. Every flag starts cleared.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutatedProps {
  /// Built for the recovery image.
  pub in_recovery: bool,

  /// Compiled with coverage instrumentation.
  pub coverage_enabled: bool,

  /// The instrumented half of a coverage split.
  pub is_coverage_variant: bool,

  /// Not visible to the module namespace.
  pub hidden: bool,

  /// Never installed to an image.
  pub prevent_install: bool,

  /// Links against the coverage runtime.
  pub link_coverage: bool,
}

/// An edge resolved to one variant of its target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantDep {
  pub target: VariantId,
  pub tag: DependencyTag,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variant {
  pub id: VariantId,
  pub module: String,
  pub kind: String,
  pub dir: String,

  /// Position of the owning module in the definition document.
  pub decl_index: usize,

  /// Variations in the order the axes were applied.
  pub variations: Vec<Variation>,

  pub props: ModuleProps,
  pub mutated: MutatedProps,
  pub deps: Vec<VariantDep>,
}

impl Variant {
  /// The variant key: non-empty variation values joined with `_`.
  ///
  /// A module that was never split, or whose only variation value is empty,
  /// has the empty key.
  pub fn name(&self) -> String {
    let values: Vec<&str> = self
      .variations
      .iter()
      .map(|v| v.value.as_str())
      .filter(|v| !v.is_empty())
      .collect();
    values.join("_")
  }

  /// The value assigned on `axis`, if the variant was split along it.
  pub fn variation(&self, axis: &str) -> Option<&str> {
    self
      .variations
      .iter()
      .find(|v| v.axis == axis)
      .map(|v| v.value.as_str())
  }

  /// `module` or `module:key` for messages.
  pub fn label(&self) -> String {
    let name = self.name();
    if name.is_empty() {
      self.module.clone()
    } else {
      format!("{}:{}", self.module, name)
    }
  }

  /// Whether this variant may be installed to an image at all.
  pub fn installable(&self) -> bool {
    self.props.installable != Some(false) && !self.mutated.prevent_install
  }
}

/// All variants of all modules, with resolved edges.
#[derive(Debug, Clone, Default, Serialize)]
pub struct VariantGraph {
  variants: Vec<Variant>,

  #[serde(skip)]
  by_module: HashMap<String, Vec<VariantId>>,

  #[serde(skip)]
  modules: Vec<String>,
}

impl VariantGraph {
  /// Create the initial graph: one unsplit variant per module.
  pub fn from_defs(defs: &ModuleDefs) -> Result<Self, GraphError> {
    let mut ids: HashMap<&str, VariantId> = HashMap::with_capacity(defs.len());
    for (idx, def) in defs.modules.iter().enumerate() {
      match ids.entry(def.name.as_str()) {
        Entry::Occupied(_) => {
          return Err(GraphError::DuplicateModule {
            module: def.name.clone(),
          });
        }
        Entry::Vacant(slot) => {
          slot.insert(VariantId(idx));
        }
      }
    }

    let mut variants = Vec::with_capacity(defs.len());
    for (idx, def) in defs.modules.iter().enumerate() {
      let mut deps = Vec::with_capacity(def.deps.len());
      for dep in &def.deps {
        let target = ids
          .get(dep.name.as_str())
          .copied()
          .ok_or_else(|| GraphError::MissingDependency {
            module: def.name.clone(),
            dependency: dep.name.clone(),
          })?;
        deps.push(VariantDep {
          target,
          tag: dep.tag.clone(),
        });
      }

      variants.push(Variant {
        id: VariantId(idx),
        module: def.name.clone(),
        kind: def.kind.clone(),
        dir: def.dir.clone(),
        decl_index: idx,
        variations: Vec::new(),
        props: def.props.clone(),
        mutated: MutatedProps::default(),
        deps,
      });
    }

    Ok(Self::from_variants(variants))
  }

  /// Index a list of variants whose ids equal their positions.
  pub(crate) fn from_variants(variants: Vec<Variant>) -> Self {
    debug_assert!(variants.iter().enumerate().all(|(idx, v)| v.id == VariantId(idx)));

    let mut by_module: HashMap<String, Vec<VariantId>> = HashMap::new();
    let mut modules = Vec::new();
    for variant in &variants {
      by_module
        .entry(variant.module.clone())
        .or_insert_with(|| {
          modules.push(variant.module.clone());
          Vec::new()
        })
        .push(variant.id);
    }

    Self {
      variants,
      by_module,
      modules,
    }
  }

  /// All variants, grouped by module in declaration order.
  pub fn variants(&self) -> &[Variant] {
    &self.variants
  }

  pub fn get(&self, id: VariantId) -> Option<&Variant> {
    self.variants.get(id.0)
  }

  /// Mutable access for post-mutation passes that only touch mutated flags.
  pub(crate) fn variant_mut(&mut self, id: VariantId) -> &mut Variant {
    &mut self.variants[id.0]
  }

  /// Module names in declaration order.
  pub fn modules(&self) -> impl Iterator<Item = &str> {
    self.modules.iter().map(String::as_str)
  }

  /// Variants of `module`, in creation order. Empty for unknown modules.
  pub fn variants_of(&self, module: &str) -> &[VariantId] {
    self.by_module.get(module).map(Vec::as_slice).unwrap_or(&[])
  }

  /// The variant of `module` whose key is `name`.
  pub fn variant(&self, module: &str, name: &str) -> Option<&Variant> {
    self
      .variants_of(module)
      .iter()
      .map(|&id| &self[id])
      .find(|v| v.name() == name)
  }

  /// Direct dependencies of a variant, in edge order.
  pub fn dependencies(&self, id: VariantId) -> impl Iterator<Item = (&Variant, &DependencyTag)> {
    self
      .get(id)
      .into_iter()
      .flat_map(|v| v.deps.iter())
      .map(|dep| (&self[dep.target], &dep.tag))
  }

  pub fn len(&self) -> usize {
    self.variants.len()
  }

  pub fn is_empty(&self) -> bool {
    self.variants.is_empty()
  }
}

impl Index<VariantId> for VariantGraph {
  type Output = Variant;

  fn index(&self, id: VariantId) -> &Variant {
    &self.variants[id.0]
  }
}
