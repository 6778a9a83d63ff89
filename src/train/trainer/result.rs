//! Training result type

use std::path::PathBuf;

/// Result of a training run
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TrainResult {
    /// Optimizer steps taken
    pub global_step: usize,
    /// Epochs fully completed
    pub epochs_completed: usize,
    /// Mean training loss over all optimizer steps
    pub training_loss: f32,
    /// Lowest validation loss, when evaluation ran
    pub best_metric: Option<f32>,
    pub best_model_checkpoint: Option<PathBuf>,
    /// Batch size the run finished with
    pub train_batch_size: usize,
    /// Whether a callback stopped training early
    pub stopped_early: bool,
    /// Total training time in seconds
    pub elapsed_secs: f64,
}
