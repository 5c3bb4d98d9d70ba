//! Pasture CLI
//!
//! Evaluate and check livestock sensor rules from the command line.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt};

/// Pasture CLI: evaluate sensor rules against readings.
#[derive(Parser, Debug)]
#[command(name = "pasture", version, about)]
struct Cli {
    /// Engine configuration file (TOML).
    #[arg(long, env = "PASTURE_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Output format.
    #[arg(long, default_value = "text", global = true)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Evaluate one rule against a set of readings.
    Eval(commands::eval::EvalArgs),
    /// Compile rules without evaluating them.
    Check(commands::check::CheckArgs),
    /// Evaluate every rule in a rules file.
    Run(commands::run::RunArgs),
}

fn main() -> anyhow::Result<()> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let engine = commands::load_engine(cli.config.as_deref())?;

    match cli.command {
        Command::Eval(args) => commands::eval::run(&engine, &args, &cli.format),
        Command::Check(args) => commands::check::run(&engine, &args, &cli.format),
        Command::Run(args) => commands::run::run(&engine, &args, &cli.format),
    }
}
