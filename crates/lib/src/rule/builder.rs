use std::collections::{BTreeMap, HashSet};

use tracing::debug;

use crate::executor::Executor;
use crate::path::BuildPath;
use crate::util::hash::NodeHash;
use crate::util::set::sorted_unique_by_key;

use super::command::Command;
use super::types::{CommandId, InstallPair, Installs, Rule, RuleError};

/// Accumulates the commands of one build-graph node.
///
/// A builder has exactly one writer: the module variant generating actions.
/// All accessors are pure and may be called any number of times; they
/// recompute the same result from the recorded commands.
///
/// Aggregation compares paths by their rendered string, so a source path and
/// an output path that render the same are one file.
#[derive(Debug, Clone, Default)]
pub struct RuleBuilder {
  commands: Vec<Command>,
  temporaries: BTreeMap<String, BuildPath>,
  installs: Vec<InstallPair>,
}

impl RuleBuilder {
  pub fn new() -> Self {
    Self::default()
  }

  /// Append a new command and return it for population.
  pub fn command(&mut self) -> &mut Command {
    let id = CommandId(self.commands.len());
    self.commands.push(Command::new(id));
    let last = self.commands.len() - 1;
    &mut self.commands[last]
  }

  /// Re-address a previously created command to keep extending it in place.
  pub fn command_mut(&mut self, id: CommandId) -> Option<&mut Command> {
    self.commands.get_mut(id.0)
  }

  /// Mark an output as internal to this rule.
  ///
  /// Temporaries are never reported as inputs or outputs. The path must be
  /// registered as an output of one of this rule's commands by the time the
  /// rule is finalized.
  pub fn temporary(&mut self, path: &BuildPath) -> &mut Self {
    self.temporaries.entry(path.to_string()).or_insert_with(|| path.clone());
    self
  }

  /// Append one final command removing every temporary marked so far. Does
  /// nothing when there are none.
  pub fn delete_temporary_files(&mut self) -> &mut Self {
    if self.temporaries.is_empty() {
      return self;
    }
    let temporaries: Vec<String> = self.temporaries.keys().cloned().collect();
    self.command().text("rm -f").flag_for_each_arg("", &temporaries);
    self
  }

  /// Record that `from` is installed to `to`. One output may be installed to
  /// several destinations.
  pub fn install(&mut self, from: &BuildPath, to: &BuildPath) -> &mut Self {
    self.installs.push(InstallPair {
      from: from.clone(),
      to: to.clone(),
    });
    self
  }

  /// One rendered string per command, in creation order.
  pub fn commands(&self) -> Vec<String> {
    self.commands.iter().map(|c| c.to_string()).collect()
  }

  /// Sorted, deduplicated tools of every command.
  pub fn tools(&self) -> Vec<BuildPath> {
    sorted_unique_by_key(self.commands.iter().flat_map(|c| c.tools.iter()), BuildPath::as_str)
  }

  /// Sorted, deduplicated outputs of every command, minus temporaries.
  pub fn outputs(&self) -> Vec<BuildPath> {
    sorted_unique_by_key(
      self
        .commands
        .iter()
        .flat_map(|c| c.all_outputs())
        .filter(|p| !self.temporaries.contains_key(p.as_str())),
      BuildPath::as_str,
    )
  }

  /// Sorted, deduplicated inputs of every command, minus temporaries and
  /// minus anything this rule produces itself.
  pub fn inputs(&self) -> Vec<BuildPath> {
    let produced = self.produced();
    sorted_unique_by_key(
      self
        .commands
        .iter()
        .flat_map(|c| c.inputs.iter())
        .filter(|p| !self.temporaries.contains_key(p.as_str()) && !produced.contains(p.as_str())),
      BuildPath::as_str,
    )
  }

  /// Rendered strings of every output, temporaries included.
  fn produced(&self) -> HashSet<&str> {
    self.commands.iter().flat_map(|c| c.all_outputs()).map(BuildPath::as_str).collect()
  }

  pub fn installs(&self) -> Installs {
    Installs(self.installs.clone())
  }

  /// Validate the rule and freeze its aggregate sets.
  ///
  /// # Errors
  ///
  /// - `MalformedFragment` if any command holds a fragment that cannot be
  ///   rendered on one command line
  /// - `NoCommands` if no command was created
  /// - `UnregisteredTemporary` if a temporary is not an output of any command
  /// - `NoOutputs` if the rule produces nothing outside itself
  pub fn finalize(self) -> Result<Rule, RuleError> {
    if let Some(command) = self.commands.iter().find(|c| c.malformed.is_some()) {
      return Err(RuleError::MalformedFragment {
        command: command.id().0,
        fragment: command.malformed.clone().unwrap_or_default(),
      });
    }

    if self.commands.is_empty() {
      return Err(RuleError::NoCommands);
    }

    let produced = self.produced();
    if let Some(temporary) = self.temporaries.values().find(|t| !produced.contains(t.as_str())) {
      return Err(RuleError::UnregisteredTemporary(temporary.clone()));
    }

    let outputs = self.outputs();
    if outputs.is_empty() {
      return Err(RuleError::NoOutputs);
    }

    Ok(Rule {
      commands: self.commands(),
      inputs: self.inputs(),
      tools: self.tools(),
      installs: self.installs(),
      outputs,
    })
  }

  /// Finalize the rule and register it with the downstream executor.
  pub fn build<E: Executor + ?Sized>(
    self,
    name: &str,
    description: &str,
    executor: &mut E,
  ) -> Result<NodeHash, RuleError> {
    if name.is_empty() {
      return Err(RuleError::EmptyName);
    }

    let rule = self.finalize()?;
    let node = rule.to_node(name, description);
    let hash = executor.register(node)?;

    debug!(rule = name, node = %hash, outputs = rule.outputs().len(), "registered rule");

    Ok(hash)
  }
}
