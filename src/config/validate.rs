//! Semantic validation of training parameters

use super::error::{ConfigError, Result};
use super::kinds::{IntervalStrategy, OptimizerKind, SchedulerType};
use super::params::{TrainingParams, UNSET};

/// Check that `repo_id` has the `owner/name` shape the Hub expects
#[must_use]
pub fn is_valid_repo_id(repo_id: &str) -> bool {
    let mut parts = repo_id.split('/');
    let valid_part = |p: &str| {
        !p.is_empty()
            && p.chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
            && !p.starts_with(['-', '.'])
    };
    matches!((parts.next(), parts.next(), parts.next()), (Some(owner), Some(name), None) if valid_part(owner) && valid_part(name))
}

fn positive(field: &str, value: usize) -> Result<()> {
    if value == 0 {
        return Err(ConfigError::invalid(field, "must be greater than 0"));
    }
    Ok(())
}

fn sentinel_or_positive(field: &str, value: i64) -> Result<()> {
    if value != UNSET && value <= 0 {
        return Err(ConfigError::invalid(
            field,
            format!("must be {UNSET} (derive automatically) or positive, got {value}"),
        ));
    }
    Ok(())
}

impl TrainingParams {
    /// Validate value ranges and option names
    ///
    /// # Errors
    ///
    /// Returns the first violated constraint. Publishing without a valid
    /// `repo_id` is a hard failure.
    pub fn validate(&self) -> Result<()> {
        if self.model_name.trim().is_empty() {
            return Err(ConfigError::invalid("model_name", "must not be empty"));
        }
        if self.data_path.trim().is_empty() {
            return Err(ConfigError::invalid("data_path", "must not be empty"));
        }
        if self.project_name.trim().is_empty() {
            return Err(ConfigError::invalid("project_name", "must not be empty"));
        }

        positive("train_batch_size", self.train_batch_size)?;
        positive("eval_batch_size", self.eval_batch_size)?;
        positive("num_train_epochs", self.num_train_epochs)?;
        positive("gradient_accumulation_steps", self.gradient_accumulation_steps)?;
        positive("model_max_length", self.model_max_length)?;
        sentinel_or_positive("block_size", self.block_size)?;
        sentinel_or_positive("logging_steps", self.logging_steps)?;

        if !(self.learning_rate > 0.0 && self.learning_rate.is_finite()) {
            return Err(ConfigError::invalid(
                "learning_rate",
                format!("must be positive, got {}", self.learning_rate),
            ));
        }
        if !(0.0..=1.0).contains(&self.warmup_ratio) {
            return Err(ConfigError::invalid(
                "warmup_ratio",
                format!("must be in [0, 1], got {}", self.warmup_ratio),
            ));
        }
        if self.weight_decay < 0.0 {
            return Err(ConfigError::invalid("weight_decay", "must not be negative"));
        }
        if self.max_grad_norm < 0.0 {
            return Err(ConfigError::invalid("max_grad_norm", "must not be negative"));
        }

        if self.use_peft {
            positive("lora_r", self.lora_r)?;
            if self.lora_alpha <= 0.0 {
                return Err(ConfigError::invalid("lora_alpha", "must be positive"));
            }
            if !(0.0..1.0).contains(&self.lora_dropout) {
                return Err(ConfigError::invalid(
                    "lora_dropout",
                    format!("must be in [0, 1), got {}", self.lora_dropout),
                ));
            }
            if self
                .target_module_list()
                .is_some_and(|modules| modules.is_empty())
            {
                return Err(ConfigError::invalid(
                    "target_modules",
                    "must name at least one module when set",
                ));
            }
        }

        self.evaluation_strategy
            .parse::<IntervalStrategy>()
            .map_err(|_| {
                ConfigError::invalid(
                    "evaluation_strategy",
                    format!("unknown strategy '{}'", self.evaluation_strategy),
                )
            })?;
        self.save_strategy
            .parse::<IntervalStrategy>()
            .map_err(|_| {
                ConfigError::invalid(
                    "save_strategy",
                    format!("unknown strategy '{}'", self.save_strategy),
                )
            })?;
        self.scheduler.parse::<SchedulerType>()?;
        self.optimizer.parse::<OptimizerKind>()?;

        if self.push_to_hub {
            match self.repo_id.as_deref() {
                Some(repo_id) if is_valid_repo_id(repo_id) => {}
                other => return Err(ConfigError::InvalidRepoId(other.map(String::from))),
            }
        }

        Ok(())
    }
}
