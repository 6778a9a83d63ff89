//! Callback system for training events
//!
//! Provides hooks for training loop events:
//! - `on_train_begin` / `on_train_end`
//! - `on_epoch_begin` / `on_epoch_end`
//! - `on_step_end`, `on_log`, `on_evaluate`, `on_save`
//!
//! # Example
//!
//! ```rust
//! use afinar::train::callback::{TrainerCallback, CallbackContext, CallbackAction};
//!
//! struct PrintCallback;
//!
//! impl TrainerCallback for PrintCallback {
//!     fn on_epoch_end(&mut self, ctx: &CallbackContext) -> CallbackAction {
//!         println!("Epoch {} finished with loss {:.4}", ctx.epoch, ctx.loss);
//!         CallbackAction::Continue
//!     }
//! }
//! ```

mod adapter;
mod manager;
mod metrics;
mod progress;
mod traits;

pub use adapter::{LoadBestAdapterCallback, SaveAdapterCallback, ADAPTER_SUBDIR};
pub use manager::CallbackManager;
pub use metrics::{MetricsLog, METRICS_FILE};
pub use progress::ProgressCallback;
pub use traits::{CallbackAction, CallbackContext, LogEntry, TrainerCallback};

/// Callbacks a run registers on top of the trainer's own
///
/// Adapter runs save only the adapter per checkpoint, and restore the best
/// adapter at the end when a validation split makes "best" meaningful.
#[must_use]
pub fn build_callbacks(use_peft: bool, has_validation: bool) -> Vec<Box<dyn TrainerCallback>> {
    let mut callbacks: Vec<Box<dyn TrainerCallback>> = Vec::new();
    if use_peft {
        callbacks.push(Box::new(SaveAdapterCallback));
        if has_validation {
            callbacks.push(Box::new(LoadBestAdapterCallback));
        }
    }
    callbacks
}
