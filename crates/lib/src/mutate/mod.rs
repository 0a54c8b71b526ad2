//! Variant mutation engine.
//!
//! A mutation pass walks the variant graph bottom-up, asks a
//! [`VariationPolicy`] which variations each module needs on one axis, clones
//! the module once per variation and re-points every dependency edge at the
//! matching clone of its target. Concrete policies live in [`image`] and
//! [`coverage`]; everything else is generic.
//!
//! ```
//! use modgraph_lib::graph::{ModuleDef, ModuleDefs, ModuleProps, VariantGraph};
//! use modgraph_lib::mutate::{MutateConfig, MutationEngine};
//! use modgraph_lib::mutate::image::ImagePlacementPolicy;
//!
//! let defs = ModuleDefs::new(vec![ModuleDef::new("init.rc", "prebuilt_etc").with_props(ModuleProps {
//!   recovery_available: true,
//!   ..Default::default()
//! })]);
//!
//! let mut engine = MutationEngine::new(MutateConfig::default());
//! engine.register("image", "prebuilt_etc", ImagePlacementPolicy);
//!
//! let (graph, _stats) = engine.run(VariantGraph::from_defs(&defs).unwrap()).unwrap();
//! assert!(graph.variant("init.rc", "core").is_some());
//! assert!(graph.variant("init.rc", "recovery").unwrap().mutated.in_recovery);
//! ```

pub mod coverage;
mod engine;
pub mod image;
mod policy;
mod types;

pub use engine::MutationEngine;
pub use policy::{FnPolicy, PatchContext, PolicyContext, VariationPolicy};
pub use types::{DefaultVariation, MutateConfig, MutateError, MutationStats};
