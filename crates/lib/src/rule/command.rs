use crate::path::BuildPath;

use super::types::CommandId;

/// One shell command line of a rule.
///
/// A command is an ordered run of text fragments plus four dependency
/// registries. Methods that take a path both render it into the command line
/// and register it, except the `implicit*` methods which only register a
/// dependency edge. Each call appends one space before its fragment unless the
/// command is still empty.
///
/// Commands are created by [`RuleBuilder::command`](super::RuleBuilder::command)
/// and every method returns `&mut Self` for chaining:
///
/// ```
/// use modgraph_lib::path::PathContext;
/// use modgraph_lib::rule::RuleBuilder;
///
/// let ctx = PathContext::new("out").unwrap();
/// let mut rule = RuleBuilder::new();
/// let cmd = rule
///   .command()
///   .tool(&ctx.source("ls").unwrap())
///   .flag_with_arg("--sort=", "time");
/// assert_eq!(cmd.to_string(), "ls --sort=time");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Command {
  id: CommandId,
  buf: String,
  pub(crate) tools: Vec<BuildPath>,
  pub(crate) inputs: Vec<BuildPath>,
  pub(crate) outputs: Vec<BuildPath>,
  pub(crate) implicit_outputs: Vec<BuildPath>,
  pub(crate) malformed: Option<String>,
}

impl Command {
  pub(crate) fn new(id: CommandId) -> Self {
    Self {
      id,
      ..Default::default()
    }
  }

  pub fn id(&self) -> CommandId {
    self.id
  }

  /// Append a literal fragment. No dependency effect.
  pub fn text(&mut self, text: impl AsRef<str>) -> &mut Self {
    self.push(text.as_ref());
    self
  }

  /// Append a flag. Identical to [`text`](Self::text), kept for readability
  /// at call sites.
  pub fn flag(&mut self, flag: &str) -> &mut Self {
    self.push(flag);
    self
  }

  /// Append `flag` immediately followed by `arg`, e.g. `--sort=time`.
  pub fn flag_with_arg(&mut self, flag: &str, arg: impl AsRef<str>) -> &mut Self {
    self.push(&format!("{}{}", flag, arg.as_ref()));
    self
  }

  /// Append `flag` followed by each argument, once per argument.
  pub fn flag_for_each_arg<S: AsRef<str>>(&mut self, flag: &str, args: &[S]) -> &mut Self {
    for arg in args {
      self.flag_with_arg(flag, arg);
    }
    self
  }

  /// Append `flag` followed by all arguments joined with `sep`.
  pub fn flag_with_list<S: AsRef<str>>(&mut self, flag: &str, list: &[S], sep: &str) -> &mut Self {
    let joined: Vec<&str> = list.iter().map(|s| s.as_ref()).collect();
    self.push(&format!("{}{}", flag, joined.join(sep)));
    self
  }

  /// Append a tool path and register it as a tool dependency.
  pub fn tool(&mut self, path: &BuildPath) -> &mut Self {
    self.push(path.as_str());
    self.tools.push(path.clone());
    self
  }

  /// Append an input path and register it as an input.
  pub fn input(&mut self, path: &BuildPath) -> &mut Self {
    self.push(path.as_str());
    self.inputs.push(path.clone());
    self
  }

  /// Append each path as its own fragment and register them as inputs.
  pub fn inputs(&mut self, paths: &[BuildPath]) -> &mut Self {
    for path in paths {
      self.input(path);
    }
    self
  }

  /// Register an input that does not appear on the command line.
  pub fn implicit(&mut self, path: &BuildPath) -> &mut Self {
    self.inputs.push(path.clone());
    self
  }

  pub fn implicits(&mut self, paths: &[BuildPath]) -> &mut Self {
    self.inputs.extend(paths.iter().cloned());
    self
  }

  /// Append an output path and register it as an output.
  pub fn output(&mut self, path: &BuildPath) -> &mut Self {
    self.push(path.as_str());
    self.outputs.push(path.clone());
    self
  }

  pub fn outputs(&mut self, paths: &[BuildPath]) -> &mut Self {
    for path in paths {
      self.output(path);
    }
    self
  }

  /// Register an output that does not appear on the command line.
  pub fn implicit_output(&mut self, path: &BuildPath) -> &mut Self {
    self.implicit_outputs.push(path.clone());
    self
  }

  pub fn implicit_outputs(&mut self, paths: &[BuildPath]) -> &mut Self {
    self.implicit_outputs.extend(paths.iter().cloned());
    self
  }

  /// Append `flag` immediately followed by an input path.
  pub fn flag_with_input(&mut self, flag: &str, path: &BuildPath) -> &mut Self {
    self.push(&format!("{}{}", flag, path));
    self.inputs.push(path.clone());
    self
  }

  /// Append `flag` followed by all input paths joined with `sep`.
  pub fn flag_with_input_list(&mut self, flag: &str, paths: &[BuildPath], sep: &str) -> &mut Self {
    let joined: Vec<&str> = paths.iter().map(|p| p.as_str()).collect();
    self.push(&format!("{}{}", flag, joined.join(sep)));
    self.inputs.extend(paths.iter().cloned());
    self
  }

  /// Append `flag` followed by each input path, once per path.
  pub fn flag_for_each_input(&mut self, flag: &str, paths: &[BuildPath]) -> &mut Self {
    for path in paths {
      self.flag_with_input(flag, path);
    }
    self
  }

  /// Append `flag` immediately followed by an output path.
  pub fn flag_with_output(&mut self, flag: &str, path: &BuildPath) -> &mut Self {
    self.push(&format!("{}{}", flag, path));
    self.outputs.push(path.clone());
    self
  }

  /// Every path this command writes, rendered or implicit.
  pub(crate) fn all_outputs(&self) -> impl Iterator<Item = &BuildPath> {
    self.outputs.iter().chain(self.implicit_outputs.iter())
  }

  fn push(&mut self, fragment: &str) {
    if self.malformed.is_none() && fragment.contains(['\n', '\0']) {
      self.malformed = Some(fragment.to_string());
    }
    if !self.buf.is_empty() {
      self.buf.push(' ');
    }
    self.buf.push_str(fragment);
  }
}

impl std::fmt::Display for Command {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(&self.buf)
  }
}
