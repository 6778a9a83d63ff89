//! Train command implementation

use crate::cli::args::TrainArgs;
use crate::cli::logging::log;
use crate::cli::LogLevel;
use crate::config::{load_params, TrainingParams, UNSET};
use crate::error::Result;
use crate::pipeline;
use crate::train::TrainingArguments;

/// Apply command-line overrides on top of the loaded parameters
pub fn apply_overrides(params: &mut TrainingParams, args: &TrainArgs) {
    if let Some(name) = &args.project_name {
        params.project_name.clone_from(name);
    }
    if let Some(epochs) = args.epochs {
        params.num_train_epochs = epochs;
    }
    if let Some(lr) = args.lr {
        params.learning_rate = lr;
    }
    if let Some(batch_size) = args.batch_size {
        params.train_batch_size = batch_size;
    }
    if args.push_to_hub {
        params.push_to_hub = true;
    }
}

pub fn run_train(args: TrainArgs, level: LogLevel) -> Result<()> {
    log(
        level,
        LogLevel::Normal,
        &format!("Afinar: training from {}", args.config.display()),
    );

    let mut params = load_params(&args.config)?;
    apply_overrides(&mut params, &args);
    params.validate()?;

    if args.dry_run {
        let logging_steps = if params.logging_steps == UNSET {
            1
        } else {
            params.logging_steps as usize
        };
        let training_args = TrainingArguments::from_params(&params, logging_steps)?;
        log(level, LogLevel::Normal, "Dry run - config validated successfully");
        log(
            level,
            LogLevel::Normal,
            &serde_json::to_string_pretty(&training_args).unwrap_or_default(),
        );
        if params.logging_steps == UNSET {
            log(
                level,
                LogLevel::Verbose,
                "  logging_steps is derived from the split sizes at run time",
            );
        }
        log(
            level,
            LogLevel::Verbose,
            &format!(
                "  Model: {} ({})",
                params.model_name,
                if params.use_peft { "LoRA" } else { "full fine-tune" }
            ),
        );
        return Ok(());
    }

    let summary = pipeline::train(params)?;

    log(
        level,
        LogLevel::Normal,
        &format!(
            "Training complete: {} steps, loss {:.4}, saved to {}",
            summary.train_result.global_step,
            summary.train_result.training_loss,
            summary.output_dir.display()
        ),
    );
    if let Some(published) = &summary.publish {
        log(level, LogLevel::Normal, &published.to_string());
    }
    Ok(())
}
