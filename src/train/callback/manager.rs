//! Callback manager for dispatching events to multiple callbacks

use std::path::Path;

use super::traits::{CallbackAction, CallbackContext, LogEntry, TrainerCallback};
use crate::model::TrainableModel;
use crate::train::error::Result;

/// Manages multiple callbacks and dispatches events in registration order
#[derive(Default)]
pub struct CallbackManager {
    callbacks: Vec<Box<dyn TrainerCallback>>,
}

impl CallbackManager {
    /// Create new callback manager
    pub fn new() -> Self {
        Self {
            callbacks: Vec::new(),
        }
    }

    /// Add a callback
    pub fn add<C: TrainerCallback + 'static>(&mut self, callback: C) {
        self.callbacks.push(Box::new(callback));
    }

    /// Add an already boxed callback
    pub fn add_boxed(&mut self, callback: Box<dyn TrainerCallback>) {
        self.callbacks.push(callback);
    }

    /// Check if no callbacks are registered
    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }

    /// Get number of callbacks
    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    /// Registered callback names, in dispatch order
    pub fn names(&self) -> Vec<&'static str> {
        self.callbacks.iter().map(|cb| cb.name()).collect()
    }

    /// Fire train begin event
    pub fn on_train_begin(&mut self, ctx: &CallbackContext) -> CallbackAction {
        for cb in &mut self.callbacks {
            if cb.on_train_begin(ctx) == CallbackAction::Stop {
                return CallbackAction::Stop;
            }
        }
        CallbackAction::Continue
    }

    /// Fire train end event; the first failing callback aborts dispatch
    pub fn on_train_end(
        &mut self,
        ctx: &CallbackContext,
        model: &mut dyn TrainableModel,
    ) -> Result<()> {
        for cb in &mut self.callbacks {
            cb.on_train_end(ctx, model)?;
        }
        Ok(())
    }

    /// Fire epoch begin event
    pub fn on_epoch_begin(&mut self, ctx: &CallbackContext) -> CallbackAction {
        for cb in &mut self.callbacks {
            match cb.on_epoch_begin(ctx) {
                CallbackAction::Stop => return CallbackAction::Stop,
                CallbackAction::SkipEpoch => return CallbackAction::SkipEpoch,
                CallbackAction::Continue => {}
            }
        }
        CallbackAction::Continue
    }

    /// Fire epoch end event
    pub fn on_epoch_end(&mut self, ctx: &CallbackContext) -> CallbackAction {
        for cb in &mut self.callbacks {
            if cb.on_epoch_end(ctx) == CallbackAction::Stop {
                return CallbackAction::Stop;
            }
        }
        CallbackAction::Continue
    }

    /// Fire step end event
    pub fn on_step_end(&mut self, ctx: &CallbackContext) -> CallbackAction {
        for cb in &mut self.callbacks {
            if cb.on_step_end(ctx) == CallbackAction::Stop {
                return CallbackAction::Stop;
            }
        }
        CallbackAction::Continue
    }

    /// Fire log event
    pub fn on_log(&mut self, ctx: &CallbackContext, entry: &LogEntry) -> Result<()> {
        for cb in &mut self.callbacks {
            cb.on_log(ctx, entry)?;
        }
        Ok(())
    }

    /// Fire evaluation event
    pub fn on_evaluate(&mut self, ctx: &CallbackContext) -> CallbackAction {
        for cb in &mut self.callbacks {
            if cb.on_evaluate(ctx) == CallbackAction::Stop {
                return CallbackAction::Stop;
            }
        }
        CallbackAction::Continue
    }

    /// Fire save event for a freshly written checkpoint
    pub fn on_save(
        &mut self,
        ctx: &CallbackContext,
        checkpoint: &Path,
        model: &dyn TrainableModel,
    ) -> Result<()> {
        for cb in &mut self.callbacks {
            cb.on_save(ctx, checkpoint, model)?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for CallbackManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackManager")
            .field("callbacks", &self.names())
            .finish()
    }
}
