//! Arguments of the training loop, derived from the run parameters

use std::path::PathBuf;

use serde::Serialize;

use super::error::{Result, TrainError};
use crate::config::{IntervalStrategy, OptimizerKind, SchedulerType, TrainingParams, UNSET};

/// Metrics sink named in the arguments
pub const REPORT_TO: &str = "tensorboard";

/// Logging interval for a run
///
/// An unset interval becomes `int(0.2 · len / train_batch_size)` over the
/// validation split when there is one, otherwise the train split, and is
/// never below 1.
#[must_use]
pub fn derive_logging_steps(
    logging_steps: i64,
    train_len: usize,
    valid_len: Option<usize>,
    train_batch_size: usize,
) -> usize {
    if logging_steps != UNSET && logging_steps > 0 {
        return logging_steps as usize;
    }
    let len = valid_len.unwrap_or(train_len);
    let steps = (0.2 * len as f64 / train_batch_size.max(1) as f64) as usize;
    steps.max(1)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrainingArguments {
    pub output_dir: PathBuf,
    pub per_device_train_batch_size: usize,
    pub per_device_eval_batch_size: usize,
    pub learning_rate: f64,
    pub num_train_epochs: usize,
    pub evaluation_strategy: IntervalStrategy,
    pub logging_steps: usize,
    /// `0` keeps every checkpoint
    pub save_total_limit: usize,
    pub save_strategy: IntervalStrategy,
    pub gradient_accumulation_steps: usize,
    pub report_to: String,
    pub auto_find_batch_size: bool,
    pub lr_scheduler_type: SchedulerType,
    pub optim: OptimizerKind,
    pub warmup_ratio: f64,
    pub weight_decay: f64,
    pub max_grad_norm: f64,
    pub fp16: bool,
    pub push_to_hub: bool,
    pub load_best_model_at_end: bool,
    pub seed: u64,
}

impl TrainingArguments {
    /// Arguments for a run; evaluation and best-model reload require a
    /// validation split
    pub fn from_params(params: &TrainingParams, logging_steps: usize) -> Result<Self> {
        let has_validation = params.has_validation();
        let evaluation_strategy = if has_validation {
            params
                .evaluation_strategy
                .parse()
                .map_err(|e| TrainError::InvalidArguments(format!("{e}")))?
        } else {
            IntervalStrategy::No
        };
        let save_strategy = params
            .save_strategy
            .parse()
            .map_err(|e| TrainError::InvalidArguments(format!("{e}")))?;
        let lr_scheduler_type = params
            .scheduler
            .parse()
            .map_err(|_| TrainError::UnknownScheduler(params.scheduler.clone()))?;
        let optim = params
            .optimizer
            .parse()
            .map_err(|_| TrainError::UnknownOptimizer(params.optimizer.clone()))?;

        let args = Self {
            output_dir: PathBuf::from(&params.project_name),
            per_device_train_batch_size: params.train_batch_size,
            per_device_eval_batch_size: params.eval_batch_size,
            learning_rate: params.learning_rate,
            num_train_epochs: params.num_train_epochs,
            evaluation_strategy,
            logging_steps,
            save_total_limit: params.save_total_limit,
            save_strategy,
            gradient_accumulation_steps: params.gradient_accumulation_steps,
            report_to: REPORT_TO.to_string(),
            auto_find_batch_size: params.auto_find_batch_size,
            lr_scheduler_type,
            optim,
            warmup_ratio: params.warmup_ratio,
            weight_decay: params.weight_decay,
            max_grad_norm: params.max_grad_norm,
            fp16: params.fp16,
            push_to_hub: false,
            load_best_model_at_end: has_validation,
            seed: params.seed as u64,
        };
        args.validate()?;
        Ok(args)
    }

    /// Consistency checks between strategies
    pub fn validate(&self) -> Result<()> {
        if self.per_device_train_batch_size == 0 || self.per_device_eval_batch_size == 0 {
            return Err(TrainError::InvalidArguments(
                "batch sizes must be positive".into(),
            ));
        }
        if self.gradient_accumulation_steps == 0 || self.logging_steps == 0 {
            return Err(TrainError::InvalidArguments(
                "gradient_accumulation_steps and logging_steps must be positive".into(),
            ));
        }
        if self.load_best_model_at_end && self.evaluation_strategy != self.save_strategy {
            return Err(TrainError::InvalidArguments(format!(
                "load_best_model_at_end requires the save and evaluation strategy to match, \
                 got evaluation_strategy={} and save_strategy={}",
                self.evaluation_strategy, self.save_strategy
            )));
        }
        Ok(())
    }

    #[must_use]
    pub fn eval_enabled(&self) -> bool {
        self.evaluation_strategy != IntervalStrategy::No
    }
}
