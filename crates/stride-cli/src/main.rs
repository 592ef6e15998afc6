mod commands;
mod output;

use clap::{Parser, Subcommand};
use commands::parse::ParseArgs;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "stride",
    version,
    about = "Extract structured training plans from coaching-plan PDFs"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a fragment stream (JSON from the PDF-text collaborator) into a structured plan
    Parse(ParseArgs),
    /// Show per-candidate quality and scan diagnostics for a fragment stream
    Inspect {
        /// Path to the fragment JSON file
        input_file: PathBuf,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Parse(args) => commands::parse::run(args),
        Commands::Inspect { input_file } => commands::inspect::run(input_file),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
