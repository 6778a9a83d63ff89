//! Command-line interface
//!
//! ```bash
//! afinar train job.yaml
//! afinar train job.yaml --epochs 3 --lr 2e-4 --dry-run
//! afinar validate job.yaml
//! afinar merge --base ./base --adapter ./run --output ./merged
//! afinar publish ./merged --repo someone/my-model
//! ```

mod args;
mod commands;
mod logging;

#[cfg(test)]
mod tests;

pub use args::{parse_args, Cli, Command, MergeArgs, PublishArgs, TrainArgs, ValidateArgs};
pub use commands::{apply_overrides, run_command};
pub use logging::{init_tracing, log, LogLevel};
