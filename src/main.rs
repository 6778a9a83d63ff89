//! Afinar CLI
//!
//! # Usage
//!
//! ```bash
//! # Fine-tune from a job file
//! afinar train job.yaml
//!
//! # Validate a job file
//! afinar validate job.yaml
//!
//! # Merge an adapter into its base model
//! afinar merge --base ./base --adapter ./run --output ./merged
//! ```

use afinar::cli::{run_command, Cli};
use clap::Parser;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run_command(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
