//! CLI entry point for the `era-sim` batch simulator.

use std::io;
use std::process::ExitCode;

use clap::Parser;
use era_cli::{init_logging, run_batch, Args};
use era_core as _;
#[cfg(test)]
use tempfile as _;
use thiserror as _;
use tracing as _;
use tracing_subscriber as _;

fn main() -> ExitCode {
    init_logging();
    let args = Args::parse();

    match run_batch(&args, &mut io::stdout().lock()) {
        Ok(summary) if summary.all_succeeded() => ExitCode::SUCCESS,
        Ok(summary) => {
            eprintln!(
                "error: {} of {} images failed",
                summary.failed,
                summary.failed + summary.simulated
            );
            ExitCode::FAILURE
        }
        Err(error) => {
            eprintln!("error: {error}");
            ExitCode::FAILURE
        }
    }
}
