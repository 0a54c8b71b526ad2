use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::COMMAND_SEPARATOR;
use crate::executor::{BuildNode, ExecutorError};
use crate::path::BuildPath;

/// Position of a command within its rule, used to re-address it after other
/// commands have been appended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct CommandId(pub usize);

/// Errors detected when a rule is finalized or handed to the executor.
#[derive(Debug, Error)]
pub enum RuleError {
  /// The rule has no commands.
  #[error("rule has no commands")]
  NoCommands,

  /// The rule produces nothing visible to the rest of the graph.
  #[error("rule has no outputs")]
  NoOutputs,

  /// A path was marked temporary without being an output of any command.
  #[error("temporary {0} is not an output of any command in the rule")]
  UnregisteredTemporary(BuildPath),

  /// A command fragment cannot be rendered into a single shell command line.
  #[error("command {command}: malformed fragment {fragment:?}")]
  MalformedFragment { command: usize, fragment: String },

  /// Rules must be named for the executor.
  #[error("rule name must not be empty")]
  EmptyName,

  /// The executor refused the finalized node.
  #[error("register failed: {0}")]
  Register(#[from] ExecutorError),
}

/// One `(output, destination)` mapping consumed by the install-graph builder.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InstallPair {
  pub from: BuildPath,
  pub to: BuildPath,
}

impl std::fmt::Display for InstallPair {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}:{}", self.from, self.to)
  }
}

/// Ordered install pairs of a rule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Installs(pub Vec<InstallPair>);

impl Installs {
  pub fn iter(&self) -> std::slice::Iter<'_, InstallPair> {
    self.0.iter()
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }
}

impl std::fmt::Display for Installs {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    for (i, pair) in self.0.iter().enumerate() {
      if i > 0 {
        f.write_str(" ")?;
      }
      write!(f, "{}", pair)?;
    }
    Ok(())
  }
}

/// A finalized rule. The aggregate sets are computed once and frozen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
  pub(crate) commands: Vec<String>,
  pub(crate) inputs: Vec<BuildPath>,
  pub(crate) outputs: Vec<BuildPath>,
  pub(crate) tools: Vec<BuildPath>,
  pub(crate) installs: Installs,
}

impl Rule {
  pub fn commands(&self) -> &[String] {
    &self.commands
  }

  pub fn inputs(&self) -> &[BuildPath] {
    &self.inputs
  }

  pub fn outputs(&self) -> &[BuildPath] {
    &self.outputs
  }

  pub fn tools(&self) -> &[BuildPath] {
    &self.tools
  }

  pub fn installs(&self) -> &Installs {
    &self.installs
  }

  /// The commands joined into a single shell invocation.
  pub fn command_line(&self) -> String {
    self.commands.join(COMMAND_SEPARATOR)
  }

  /// Describe this rule as a node for the downstream executor.
  pub fn to_node(&self, name: &str, description: &str) -> BuildNode {
    BuildNode {
      name: name.to_string(),
      description: description.to_string(),
      command: self.command_line(),
      commands: self.commands.clone(),
      inputs: strings(&self.inputs),
      outputs: strings(&self.outputs),
      tools: strings(&self.tools),
      installs: self.installs.clone(),
    }
  }
}

fn strings(paths: &[BuildPath]) -> Vec<String> {
  paths.iter().map(|p| p.to_string()).collect()
}
