//! Core traits and types for the callback system
//!
//! - `CallbackContext` - State passed to callbacks
//! - `CallbackAction` - Actions a callback can request
//! - `LogEntry` - One logged set of metrics
//! - `TrainerCallback` - The trait all callbacks implement

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::model::TrainableModel;
use crate::train::error::Result;

/// Context passed to callbacks with current training state
#[derive(Clone, Debug, Default)]
pub struct CallbackContext {
    /// Current epoch (0-indexed)
    pub epoch: usize,
    /// Total epochs planned
    pub max_epochs: usize,
    /// Optimizer step within the epoch
    pub step: usize,
    /// Optimizer steps per epoch
    pub steps_per_epoch: usize,
    /// Optimizer steps taken so far
    pub global_step: usize,
    /// Optimizer steps planned for the run
    pub max_steps: usize,
    /// Mean training loss since the last log
    pub loss: f32,
    /// Current learning rate
    pub lr: f32,
    /// Latest validation loss
    pub eval_loss: Option<f32>,
    /// Lowest validation loss seen so far
    pub best_metric: Option<f32>,
    /// Checkpoint that produced `best_metric`
    pub best_model_checkpoint: Option<PathBuf>,
    pub output_dir: PathBuf,
    /// Training duration in seconds
    pub elapsed_secs: f64,
}

/// Action to take after a callback
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CallbackAction {
    /// Continue training normally
    Continue,
    /// Stop training
    Stop,
    /// Skip rest of current epoch
    SkipEpoch,
}

/// Metrics emitted at a logging or evaluation point
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub global_step: usize,
    /// Fractional epoch
    pub epoch: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loss: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub learning_rate: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grad_norm: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eval_loss: Option<f32>,
}

/// Trait for training callbacks
///
/// All methods have default no-op implementations, so you only need to
/// implement the events you care about.
pub trait TrainerCallback: Send {
    /// Called before training starts
    fn on_train_begin(&mut self, _ctx: &CallbackContext) -> CallbackAction {
        CallbackAction::Continue
    }

    /// Called after the training loop, with the final model
    fn on_train_end(
        &mut self,
        _ctx: &CallbackContext,
        _model: &mut dyn TrainableModel,
    ) -> Result<()> {
        Ok(())
    }

    /// Called before each epoch
    fn on_epoch_begin(&mut self, _ctx: &CallbackContext) -> CallbackAction {
        CallbackAction::Continue
    }

    /// Called after each epoch
    fn on_epoch_end(&mut self, _ctx: &CallbackContext) -> CallbackAction {
        CallbackAction::Continue
    }

    /// Called after each optimizer step
    fn on_step_end(&mut self, _ctx: &CallbackContext) -> CallbackAction {
        CallbackAction::Continue
    }

    /// Called whenever metrics are logged
    fn on_log(&mut self, _ctx: &CallbackContext, _entry: &LogEntry) -> Result<()> {
        Ok(())
    }

    /// Called after a validation pass
    fn on_evaluate(&mut self, _ctx: &CallbackContext) -> CallbackAction {
        CallbackAction::Continue
    }

    /// Called after a checkpoint directory has been written
    fn on_save(
        &mut self,
        _ctx: &CallbackContext,
        _checkpoint: &Path,
        _model: &dyn TrainableModel,
    ) -> Result<()> {
        Ok(())
    }

    /// Get callback name for logging
    fn name(&self) -> &'static str {
        "TrainerCallback"
    }
}
