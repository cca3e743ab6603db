use clap::Parser;
use rill_cli::commands::Commands;
use std::process::ExitCode;

/// Segment streamed text by labels and special tokens
#[derive(Debug, Parser)]
#[command(name = "rill", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match cli.command.execute() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
