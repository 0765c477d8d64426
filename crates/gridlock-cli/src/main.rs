use std::error::Error;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use commands::reports::ReportsArgs;

mod commands;

#[derive(Parser, Debug)]
#[command(name = "gridlock", about = "Read-only monitoring for gridlock work pools")]
struct Cli {
    /// Shared root directory of the pool.
    #[arg(long)]
    root: PathBuf,
    /// Optional sub-directory under the root.
    #[arg(long)]
    subdir: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Summarize the pool document.
    Status,
    /// List all experiments with status, configuration and report counts.
    Experiments,
    /// Print the report history of one experiment.
    Reports(ReportsArgs),
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
    let cli = Cli::parse();
    let directory = match &cli.subdir {
        Some(subdir) => cli.root.join(subdir),
        None => cli.root.clone(),
    };
    match cli.command {
        Command::Status => commands::status::run(&directory),
        Command::Experiments => commands::experiments::run(&directory),
        Command::Reports(args) => commands::reports::run(&directory, &args),
    }
}
