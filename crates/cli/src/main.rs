mod cmd;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::output::print_error;

/// modgraph - expand module definitions into a variant-aware build graph
#[derive(Parser)]
#[command(name = "modgraph")]
#[command(author, version, about, long_about = None)]
struct Cli {
  #[command(flatten)]
  global: GlobalArgs,

  #[command(subcommand)]
  command: Commands,
}

/// Flags shared by every subcommand. Each one overrides its environment
/// variable counterpart.
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
  /// Enable verbose output
  #[arg(short, long, global = true)]
  pub verbose: bool,

  /// Root directory for generated files
  #[arg(long, global = true, value_name = "DIR")]
  pub out_dir: Option<String>,

  /// Number of worker threads
  #[arg(short, long, global = true, value_name = "N")]
  pub jobs: Option<usize>,

  /// Build instrumented coverage variants
  #[arg(long, global = true)]
  pub coverage: bool,

  /// Only instrument modules under this directory (repeatable)
  #[arg(long = "coverage-path", global = true, value_name = "PREFIX")]
  pub coverage_paths: Vec<String>,
}

#[derive(Subcommand)]
enum Commands {
  /// Summarize the planned variants and rules
  Plan {
    /// Path to the module definition file
    file: PathBuf,

    /// Print the full plan as JSON
    #[arg(long)]
    json: bool,
  },

  /// Write the build graph consumed by the executor
  Graph {
    /// Path to the module definition file
    file: PathBuf,

    /// Write to this file instead of stdout
    #[arg(short, long, value_name = "OUT")]
    output: Option<PathBuf>,
  },

  /// List every variant with its flags
  Variants {
    /// Path to the module definition file
    file: PathBuf,
  },
}

fn main() -> ExitCode {
  let cli = Cli::parse();

  let default_level = if cli.global.verbose { "debug" } else { "warn" };
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  let result = match cli.command {
    Commands::Plan { file, json } => cmd::cmd_plan(&file, &cli.global, json),
    Commands::Graph { file, output } => cmd::cmd_graph(&file, &cli.global, output.as_deref()),
    Commands::Variants { file } => cmd::cmd_variants(&file, &cli.global),
  };

  match result {
    Ok(()) => ExitCode::SUCCESS,
    Err(e) => {
      print_error(&format!("{:#}", e));
      ExitCode::FAILURE
    }
  }
}
