//! Adapter-aware checkpoint callbacks
//!
//! With LoRA training only the adapter is worth keeping per checkpoint.
//! [`SaveAdapterCallback`] replaces the checkpoint's full weight file with
//! an `adapter_model/` directory and [`LoadBestAdapterCallback`] restores
//! the best checkpoint's adapter once training ends.

use std::path::Path;

use tracing::{info, warn};

use super::traits::{CallbackContext, TrainerCallback};
use crate::hf_pipeline::WEIGHTS_FILE;
use crate::model::TrainableModel;
use crate::train::error::Result;

/// Subdirectory of a checkpoint holding adapter files
pub const ADAPTER_SUBDIR: &str = "adapter_model";

/// Writes `adapter_model/` into each checkpoint and drops the full weights
#[derive(Clone, Debug, Default)]
pub struct SaveAdapterCallback;

impl TrainerCallback for SaveAdapterCallback {
    fn on_save(
        &mut self,
        _ctx: &CallbackContext,
        checkpoint: &Path,
        model: &dyn TrainableModel,
    ) -> Result<()> {
        if !model.save_adapter(&checkpoint.join(ADAPTER_SUBDIR))? {
            return Ok(());
        }
        let weights = checkpoint.join(WEIGHTS_FILE);
        if weights.exists() {
            std::fs::remove_file(&weights)?;
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "SaveAdapterCallback"
    }
}

/// Loads the best checkpoint's adapter into the model at the end of training
#[derive(Clone, Debug, Default)]
pub struct LoadBestAdapterCallback;

impl TrainerCallback for LoadBestAdapterCallback {
    fn on_train_end(
        &mut self,
        ctx: &CallbackContext,
        model: &mut dyn TrainableModel,
    ) -> Result<()> {
        let Some(best) = ctx.best_model_checkpoint.as_deref() else {
            warn!("no best checkpoint recorded, keeping the final adapter weights");
            return Ok(());
        };
        let adapter_dir = best.join(ADAPTER_SUBDIR);
        if !adapter_dir.is_dir() {
            warn!(
                path = %adapter_dir.display(),
                "best checkpoint has no adapter, keeping the final adapter weights"
            );
            return Ok(());
        }
        info!(
            checkpoint = %best.display(),
            score = ?ctx.best_metric,
            "Loading best adapter model"
        );
        model.load_adapter(&adapter_dir)?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "LoadBestAdapterCallback"
    }
}
