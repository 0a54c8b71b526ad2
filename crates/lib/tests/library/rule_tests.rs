use std::collections::HashSet;

use modgraph_lib::executor::BuildGraph;
use modgraph_lib::path::BuildPath;
use modgraph_lib::rule::{RuleBuilder, RuleError};
use proptest::prelude::*;

use super::common::{ctx, output, rendered, source};

const NAMES: [&str; 5] = ["a", "b", "Tool", "c/d", "input"];

/// How a path argument is spelled.
///
/// `Aliased` is a source path that renders exactly like the output of the
/// same name, so aggregation must treat the two as one file.
#[derive(Debug, Clone, Copy)]
enum Spelling {
  Source,
  Output,
  Aliased,
}

#[derive(Debug, Clone)]
enum Op {
  Text(usize),
  Tool(usize),
  Input(usize, Spelling),
  Implicit(usize, Spelling),
  Output(usize),
  ImplicitOutput(usize),
}

fn spelling() -> impl Strategy<Value = Spelling> {
  prop_oneof![Just(Spelling::Source), Just(Spelling::Output), Just(Spelling::Aliased)]
}

fn op() -> impl Strategy<Value = Op> {
  let idx = 0..NAMES.len();
  prop_oneof![
    idx.clone().prop_map(Op::Text),
    idx.clone().prop_map(Op::Tool),
    (idx.clone(), spelling()).prop_map(|(i, s)| Op::Input(i, s)),
    (idx.clone(), spelling()).prop_map(|(i, s)| Op::Implicit(i, s)),
    idx.clone().prop_map(Op::Output),
    idx.prop_map(Op::ImplicitOutput),
  ]
}

fn path(idx: usize, spelling: Spelling) -> BuildPath {
  match spelling {
    Spelling::Source => source(NAMES[idx]),
    Spelling::Output => output(NAMES[idx]),
    Spelling::Aliased => source(&format!("out/{}", NAMES[idx])),
  }
}

fn build(commands: &[Vec<Op>], temporaries: &[(usize, bool)]) -> RuleBuilder {
  let mut rule = RuleBuilder::new();
  let mut produced = HashSet::new();

  for ops in commands {
    let cmd = rule.command();
    for op in ops {
      match *op {
        Op::Text(i) => {
          cmd.text(NAMES[i]);
        }
        Op::Tool(i) => {
          cmd.tool(&source(NAMES[i]));
        }
        Op::Input(i, s) => {
          cmd.input(&path(i, s));
        }
        Op::Implicit(i, s) => {
          cmd.implicit(&path(i, s));
        }
        Op::Output(i) => {
          produced.insert(i);
          cmd.output(&output(NAMES[i]));
        }
        Op::ImplicitOutput(i) => {
          produced.insert(i);
          cmd.implicit_output(&output(NAMES[i]));
        }
      }
    }
  }

  for &(i, aliased) in temporaries {
    if produced.contains(&i) {
      let spelling = if aliased { Spelling::Aliased } else { Spelling::Output };
      rule.temporary(&path(i, spelling));
    }
  }
  rule
}

fn strictly_ascending(paths: &[String]) -> bool {
  paths.windows(2).all(|w| w[0] < w[1])
}

fn rule_strategy() -> impl Strategy<Value = (Vec<Vec<Op>>, Vec<(usize, bool)>)> {
  (
    prop::collection::vec(prop::collection::vec(op(), 0..6), 1..4),
    prop::collection::vec((0..NAMES.len(), any::<bool>()), 0..3),
  )
}

proptest! {
  #[test]
  fn aggregation_is_idempotent((commands, temporaries) in rule_strategy()) {
    let rule = build(&commands, &temporaries);

    prop_assert_eq!(rule.inputs(), rule.inputs());
    prop_assert_eq!(rule.outputs(), rule.outputs());
    prop_assert_eq!(rule.tools(), rule.tools());
    prop_assert_eq!(rule.commands(), rule.commands());

    let (inputs, outputs, tools) = (rule.inputs(), rule.outputs(), rule.tools());
    if let Ok(finalized) = rule.finalize() {
      prop_assert_eq!(finalized.inputs(), inputs.as_slice());
      prop_assert_eq!(finalized.outputs(), outputs.as_slice());
      prop_assert_eq!(finalized.tools(), tools.as_slice());
    }
  }

  #[test]
  fn inputs_and_outputs_are_disjoint((commands, temporaries) in rule_strategy()) {
    let rule = build(&commands, &temporaries);
    let inputs: HashSet<String> = rendered(&rule.inputs()).into_iter().collect();
    let outputs: HashSet<String> = rendered(&rule.outputs()).into_iter().collect();

    prop_assert!(inputs.is_disjoint(&outputs));
    // Only produced paths are ever marked temporary.
    for &(i, _) in temporaries.iter().filter(|&&(i, _)| rule_marks(&commands, i)) {
      let temporary = output(NAMES[i]).to_string();
      prop_assert!(!inputs.contains(&temporary));
      prop_assert!(!outputs.contains(&temporary));
    }
  }

  #[test]
  fn aggregates_are_sorted_and_unique((commands, temporaries) in rule_strategy()) {
    let rule = build(&commands, &temporaries);
    prop_assert!(strictly_ascending(&rendered(&rule.inputs())));
    prop_assert!(strictly_ascending(&rendered(&rule.outputs())));
    prop_assert!(strictly_ascending(&rendered(&rule.tools())));
  }

  #[test]
  fn built_node_is_sorted_unique_and_disjoint((commands, temporaries) in rule_strategy()) {
    let rule = build(&commands, &temporaries);
    if let Ok(finalized) = rule.finalize() {
      let node = finalized.to_node("rule", "generated rule");
      prop_assert!(strictly_ascending(&node.inputs));
      prop_assert!(strictly_ascending(&node.outputs));
      prop_assert!(strictly_ascending(&node.tools));
      prop_assert!(node.inputs.iter().all(|input| !node.outputs.contains(input)));
    }
  }
}

fn rule_marks(commands: &[Vec<Op>], idx: usize) -> bool {
  commands
    .iter()
    .flatten()
    .any(|op| matches!(op, Op::Output(i) | Op::ImplicitOutput(i) if *i == idx))
}

#[test]
fn simple_pipe_rule() {
  let mut rule = RuleBuilder::new();
  rule
    .command()
    .tool(&source("cp"))
    .input(&source("a"))
    .output(&output("b"));
  rule
    .command()
    .tool(&source("cp"))
    .input(&output("b"))
    .output(&output("c"));
  rule.temporary(&output("b")).delete_temporary_files();

  assert_eq!(rule.commands(), vec!["cp a out/b", "cp out/b out/c", "rm -f out/b"]);
  assert_eq!(rendered(&rule.inputs()), vec!["a"]);
  assert_eq!(rendered(&rule.outputs()), vec!["out/c"]);
  assert_eq!(rendered(&rule.tools()), vec!["cp"]);
}

#[test]
fn cross_command_intermediate_is_pruned_from_inputs() {
  let mut rule = RuleBuilder::new();
  rule.command().tool(&source("gen")).output(&output("output2"));
  rule
    .command()
    .tool(&source("cat"))
    .input(&output("output2"))
    .output(&output("output3"));

  let inputs = rule.inputs();
  let outputs = rule.outputs();
  assert!(!inputs.contains(&output("output2")));
  assert!(outputs.contains(&output("output2")));
  assert!(outputs.contains(&output("output3")));
}

#[test]
fn commands_stay_addressable() {
  let mut rule = RuleBuilder::new();
  let first = rule.command().tool(&source("ld")).id();
  rule.command().text("echo done");

  rule.command_mut(first).unwrap().flag_with_output("-o ", &output("linked"));

  assert_eq!(rule.commands(), vec!["ld -o out/linked", "echo done"]);
}

#[test]
fn source_spelling_of_an_output_is_not_an_input() {
  let mut rule = RuleBuilder::new();
  rule
    .command()
    .tool(&source("cp"))
    .input(&source("a"))
    .output(&output("b"));
  rule
    .command()
    .tool(&source("cp"))
    .input(&source("out/b"))
    .input(&output("b"))
    .output(&output("c"));

  let mut graph = BuildGraph::new();
  let hash = rule.build("pipe", "copy through b", &mut graph).unwrap();

  let node = graph.node(&hash).unwrap();
  assert_eq!(node.inputs, vec!["a"]);
  assert_eq!(node.outputs, vec!["out/b", "out/c"]);
}

#[test]
fn build_hands_node_to_graph() {
  let ctx = ctx();
  let out = output("etc/hosts");

  let mut rule = RuleBuilder::new();
  rule.command().text("cp -f").input(&source("hosts")).output(&out);
  rule.install(&out, &ctx.install("system/etc/hosts").unwrap());

  let mut graph = BuildGraph::new();
  let hash = rule.build("hosts", "copy hosts", &mut graph).unwrap();

  let node = graph.node(&hash).unwrap();
  assert_eq!(node.command, "cp -f hosts out/etc/hosts");
  assert_eq!(graph.producer("out/etc/hosts"), Some(&hash));
  assert_eq!(node.installs.to_string(), "out/etc/hosts:/system/etc/hosts");
}

#[test]
fn rule_without_outputs_is_rejected_by_build() {
  let mut rule = RuleBuilder::new();
  rule.command().text("true");

  let mut graph = BuildGraph::new();
  assert!(matches!(rule.build("noop", "noop", &mut graph), Err(RuleError::NoOutputs)));
  assert!(graph.is_empty());
}
