//! Rule compiler.
//!
//! A [`RuleBuilder`] accumulates an ordered sequence of shell commands and
//! compiles them into one minimal build-graph node: the rule's commands, the
//! inputs and tools the executor must have ready before running it, and the
//! outputs it promises to produce.
//!
//! # Aggregation
//!
//! - Tools: every command's tools, deduplicated and sorted
//! - Outputs: every command's outputs minus temporaries
//! - Inputs: every command's inputs minus temporaries and minus anything the
//!   rule itself produces
//!
//! A file written by one command and read by a later one is data flow inside
//! the rule. The commands already run in order, so it is never advertised as
//! an input. Temporaries are hidden from both sides.
//!
//! # Example
//!
//! ```
//! use modgraph_lib::path::PathContext;
//! use modgraph_lib::rule::RuleBuilder;
//!
//! let ctx = PathContext::new("out").unwrap();
//! let mut rule = RuleBuilder::new();
//! rule
//!   .command()
//!   .tool(&ctx.source("ld").unwrap())
//!   .inputs(&[ctx.source("a.o").unwrap(), ctx.source("b.o").unwrap()])
//!   .flag_with_output("-o ", &ctx.output("linked").unwrap());
//! rule.command().text("echo success");
//!
//! assert_eq!(rule.commands().join(" && "), "ld a.o b.o -o out/linked && echo success");
//! ```

mod builder;
mod command;
mod types;

pub use builder::RuleBuilder;
pub use command::Command;
pub use types::*;
