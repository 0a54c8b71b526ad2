//! modgraph-lib: Core types and logic for modgraph
//!
//! This crate turns a declarative module graph into a build graph:
//! - `graph`: module definitions, variants and the dependency DAG
//! - `mutate`: the bottom-up variant mutation engine and its policies
//! - `rule`: the rule builder that compiles shell commands into build nodes
//! - `executor`: the interface to the downstream build executor
//! - `modules`: concrete module kinds
//! - `plan`: the end-to-end pipeline

pub mod consts;
pub mod executor;
pub mod graph;
pub mod modules;
pub mod mutate;
pub mod path;
pub mod plan;
pub mod rule;
pub mod util;

pub use plan::{Plan, PlanConfig, PlanError, plan};
