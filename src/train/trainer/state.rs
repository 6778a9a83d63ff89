//! Persisted trainer state

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::train::callback::LogEntry;
use crate::train::error::Result;

/// File written into every checkpoint directory
pub const TRAINER_STATE_FILE: &str = "trainer_state.json";

/// Progress of a run, as stored next to each checkpoint
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainerState {
    /// Fractional epoch
    pub epoch: f64,
    pub global_step: usize,
    pub max_steps: usize,
    pub num_train_epochs: usize,
    pub logging_steps: usize,
    pub train_batch_size: usize,
    pub best_metric: Option<f32>,
    pub best_model_checkpoint: Option<PathBuf>,
    pub log_history: Vec<LogEntry>,
}

impl TrainerState {
    pub fn save(&self, dir: &Path) -> Result<()> {
        std::fs::create_dir_all(dir)?;
        std::fs::write(
            dir.join(TRAINER_STATE_FILE),
            serde_json::to_string_pretty(self)?,
        )?;
        Ok(())
    }

    pub fn load(dir: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(dir.join(TRAINER_STATE_FILE))?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Record `metric` if it improves on the best so far (lower is better)
    pub fn observe_metric(&mut self, metric: f32, checkpoint: &Path) -> bool {
        let improved = self.best_metric.map_or(true, |best| metric < best);
        if improved {
            self.best_metric = Some(metric);
            self.best_model_checkpoint = Some(checkpoint.to_path_buf());
        }
        improved
    }
}
