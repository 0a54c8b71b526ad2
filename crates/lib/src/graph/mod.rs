//! Module dependency graph.
//!
//! Modules arrive as already-structured [`ModuleDefs`] and are turned into a
//! [`VariantGraph`] holding one implicit variant per module. Mutation passes
//! then replace that graph with new ones in which modules may have several
//! variants and every edge points at one specific variant.
//!
//! # Submodules
//!
//! - [`module`] - declarative module definitions and their properties
//! - [`variant`] - variants, resolved edges and the variant graph
//! - [`dag`] - cycle detection and dependency-ordered waves

pub mod dag;
pub mod module;
mod types;
pub mod variant;

pub use dag::ModuleDag;
pub use module::{Dependency, DependencyTag, LinkKind, ModuleDef, ModuleDefs, ModuleProps};
pub use types::GraphError;
pub use variant::{MutatedProps, Variant, VariantDep, VariantGraph, VariantId, Variation};
