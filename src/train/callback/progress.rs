//! Progress callback for logging training progress

use tracing::info;

use super::traits::{CallbackAction, CallbackContext, LogEntry, TrainerCallback};
use crate::train::error::Result;

/// Logs epochs, periodic steps and metric entries through `tracing`
#[derive(Clone, Debug)]
pub struct ProgressCallback {
    /// Log every N optimizer steps
    log_interval: usize,
}

impl ProgressCallback {
    /// Create progress callback
    pub fn new(log_interval: usize) -> Self {
        Self {
            log_interval: log_interval.max(1),
        }
    }
}

impl Default for ProgressCallback {
    fn default() -> Self {
        Self { log_interval: 10 }
    }
}

impl TrainerCallback for ProgressCallback {
    fn on_train_begin(&mut self, ctx: &CallbackContext) -> CallbackAction {
        info!(
            epochs = ctx.max_epochs,
            steps_per_epoch = ctx.steps_per_epoch,
            max_steps = ctx.max_steps,
            "***** Running training *****"
        );
        CallbackAction::Continue
    }

    fn on_epoch_begin(&mut self, ctx: &CallbackContext) -> CallbackAction {
        info!(
            "Epoch {}/{} starting (lr: {:.2e})",
            ctx.epoch + 1,
            ctx.max_epochs,
            ctx.lr
        );
        CallbackAction::Continue
    }

    fn on_epoch_end(&mut self, ctx: &CallbackContext) -> CallbackAction {
        let val_str = ctx
            .eval_loss
            .map(|v| format!(", eval_loss: {v:.4}"))
            .unwrap_or_default();

        info!(
            "Epoch {}/{}: loss: {:.4}{} ({:.1}s)",
            ctx.epoch + 1,
            ctx.max_epochs,
            ctx.loss,
            val_str,
            ctx.elapsed_secs
        );
        CallbackAction::Continue
    }

    fn on_step_end(&mut self, ctx: &CallbackContext) -> CallbackAction {
        if ctx.step > 0 && ctx.step % self.log_interval == 0 {
            info!(
                "  Step {}/{}: loss: {:.4}",
                ctx.step, ctx.steps_per_epoch, ctx.loss
            );
        }
        CallbackAction::Continue
    }

    fn on_log(&mut self, _ctx: &CallbackContext, entry: &LogEntry) -> Result<()> {
        match serde_json::to_string(entry) {
            Ok(line) => info!("{line}"),
            Err(e) => tracing::debug!(error = %e, "could not render log entry"),
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "ProgressCallback"
    }
}
