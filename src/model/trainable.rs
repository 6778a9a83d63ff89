//! The seam between the training driver and the two fine-tuning strategies

use std::fmt;
use std::path::Path;

use ndarray::Array2;

use super::config::ModelConfig;
use super::error::Result;
use crate::lora::MergeReport;
use crate::parameter::Parameter;

/// A stacked batch of equal-length blocks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    /// `[batch, seq]`
    pub input_ids: Array2<u32>,
    /// `[batch, seq]`; position `t + 1` is the target of position `t`
    pub labels: Array2<u32>,
}

impl Batch {
    #[must_use]
    pub fn new(input_ids: Array2<u32>, labels: Array2<u32>) -> Self {
        Self { input_ids, labels }
    }

    #[must_use]
    pub fn batch_size(&self) -> usize {
        self.input_ids.nrows()
    }

    #[must_use]
    pub fn seq_len(&self) -> usize {
        self.input_ids.ncols()
    }

    /// Number of next-token predictions in the batch
    #[must_use]
    pub fn num_targets(&self) -> usize {
        self.batch_size() * self.seq_len().saturating_sub(1)
    }
}

/// Result of one forward pass
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StepOutput {
    /// Mean next-token cross entropy
    pub loss: f32,
    /// Predictions the loss was averaged over
    pub num_tokens: usize,
}

/// Scalar counts over all weights
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParameterCount {
    pub total: usize,
    pub trainable: usize,
}

impl fmt::Display for ParameterCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let percent = if self.total == 0 {
            0.0
        } else {
            100.0 * self.trainable as f64 / self.total as f64
        };
        write!(
            f,
            "trainable params: {} || all params: {} || trainable%: {percent:.4}",
            self.trainable, self.total
        )
    }
}

/// Which strategy a model implements
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelKind {
    FullFineTune,
    Lora,
}

impl ModelKind {
    /// Whether the strategy trains a separable adapter
    #[must_use]
    pub fn has_adapter(self) -> bool {
        matches!(self, Self::Lora)
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FullFineTune => write!(f, "full"),
            Self::Lora => write!(f, "lora"),
        }
    }
}

/// A model the training driver can optimize, save and merge
pub trait TrainableModel {
    fn kind(&self) -> ModelKind;

    fn config(&self) -> &ModelConfig;

    fn config_mut(&mut self) -> &mut ModelConfig;

    /// Parameters handed to the optimizer, in a stable order
    fn trainable_parameters(&mut self) -> Vec<&mut Parameter>;

    fn num_parameters(&self) -> ParameterCount;

    /// Loss plus gradients accumulated into the trainable parameters
    fn forward_backward(&mut self, batch: &Batch, grad_scale: f32) -> Result<StepOutput>;

    /// Loss only
    fn eval_loss(&mut self, batch: &Batch) -> Result<StepOutput>;

    /// Write the final artifact into `dir`
    fn save(&self, dir: &Path) -> Result<()>;

    /// Write the full training state into a checkpoint directory
    fn save_checkpoint(&self, dir: &Path) -> Result<()>;

    /// Restore the trainable state from a checkpoint directory
    fn load_checkpoint(&mut self, dir: &Path) -> Result<()>;

    /// Write adapter files; `false` when the strategy has no adapter
    fn save_adapter(&self, dir: &Path) -> Result<bool>;

    /// Read adapter files; `false` when the strategy has no adapter
    fn load_adapter(&mut self, dir: &Path) -> Result<bool>;

    /// Merge the saved adapter in `target` into the base model in `base_dir`
    ///
    /// Returns `None` for strategies without an adapter.
    fn merge(&self, base_dir: &Path, target: &Path) -> Result<Option<MergeReport>>;
}
