//! Validate command implementation

use crate::cli::args::ValidateArgs;
use crate::cli::logging::log;
use crate::cli::LogLevel;
use crate::config::load_params;
use crate::error::Result;

pub fn run_validate(args: ValidateArgs, level: LogLevel) -> Result<()> {
    let params = load_params(&args.config)?;
    params.validate()?;

    log(level, LogLevel::Normal, "Configuration is valid");
    log(level, LogLevel::Verbose, &format!("  Model: {}", params.model_name));
    log(level, LogLevel::Verbose, &format!("  Data: {}", params.data_path));
    log(
        level,
        LogLevel::Verbose,
        &format!(
            "  Splits: train={} valid={}",
            params.train_split,
            params.valid_split.as_deref().unwrap_or("-")
        ),
    );
    log(
        level,
        LogLevel::Verbose,
        &format!(
            "  Optimizer: {} (lr={}), scheduler: {}",
            params.optimizer, params.learning_rate, params.scheduler
        ),
    );
    Ok(())
}
