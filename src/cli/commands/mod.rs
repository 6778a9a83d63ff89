//! CLI command implementations

mod merge;
mod publish;
mod train;
mod validate;

use super::args::{Cli, Command};
use super::logging::{init_tracing, LogLevel};
use crate::error::Result;

pub use train::apply_overrides;

/// Execute a CLI command based on the parsed arguments
pub fn run_command(cli: Cli) -> Result<()> {
    let level = LogLevel::from_flags(cli.verbose, cli.quiet);
    init_tracing(level);

    match cli.command {
        Command::Train(args) => train::run_train(args, level),
        Command::Validate(args) => validate::run_validate(args, level),
        Command::Merge(args) => merge::run_merge(args, level),
        Command::Publish(args) => publish::run_publish(args, level),
    }
}
