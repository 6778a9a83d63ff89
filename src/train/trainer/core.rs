//! Core Trainer struct and basic methods

use std::time::Instant;

use super::state::TrainerState;
use crate::train::args::TrainingArguments;
use crate::train::callback::{
    CallbackContext, CallbackManager, MetricsLog, ProgressCallback, TrainerCallback,
};

/// Built-in training loop over a [`crate::model::TrainableModel`]
///
/// Always registers a [`ProgressCallback`] and a [`MetricsLog`] ahead of the
/// callbacks passed in.
pub struct Trainer {
    pub(crate) args: TrainingArguments,

    pub(crate) callbacks: CallbackManager,

    pub(crate) state: TrainerState,

    /// Loss reported by the latest evaluation
    pub(crate) last_eval_loss: Option<f32>,

    pub(crate) start_time: Option<Instant>,
}

impl Trainer {
    pub fn new(args: TrainingArguments, callbacks: Vec<Box<dyn TrainerCallback>>) -> Self {
        let mut manager = CallbackManager::new();
        manager.add(ProgressCallback::new(args.logging_steps));
        manager.add(MetricsLog::new(&args.output_dir));
        for callback in callbacks {
            manager.add_boxed(callback);
        }
        Self {
            args,
            callbacks: manager,
            state: TrainerState::default(),
            last_eval_loss: None,
            start_time: None,
        }
    }

    /// Add a callback to the trainer
    pub fn add_callback<C: TrainerCallback + 'static>(&mut self, callback: C) {
        self.callbacks.add(callback);
    }

    pub fn args(&self) -> &TrainingArguments {
        &self.args
    }

    /// State of the latest (or current) run
    pub fn state(&self) -> &TrainerState {
        &self.state
    }

    /// Get reference to callback manager
    pub fn callbacks(&self) -> &CallbackManager {
        &self.callbacks
    }

    /// Build callback context from current state
    pub(crate) fn build_context(
        &self,
        epoch: usize,
        step: usize,
        steps_per_epoch: usize,
        loss: f32,
        lr: f32,
    ) -> CallbackContext {
        CallbackContext {
            epoch,
            max_epochs: self.args.num_train_epochs,
            step,
            steps_per_epoch,
            global_step: self.state.global_step,
            max_steps: self.state.max_steps,
            loss,
            lr,
            eval_loss: self.last_eval_loss,
            best_metric: self.state.best_metric,
            best_model_checkpoint: self.state.best_model_checkpoint.clone(),
            output_dir: self.args.output_dir.clone(),
            elapsed_secs: self.start_time.map_or(0.0, |t| t.elapsed().as_secs_f64()),
        }
    }
}

impl std::fmt::Debug for Trainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Trainer")
            .field("args", &self.args)
            .field("callbacks", &self.callbacks)
            .field("global_step", &self.state.global_step)
            .finish()
    }
}
