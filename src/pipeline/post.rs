//! Post-processing: save, merge and publish the trained model

use std::path::Path;

use tracing::info;

use crate::config::TrainingParams;
use crate::error::Result;
use crate::hf_pipeline::{HfPublisher, PublishConfig, PublishResult};
use crate::lora::MergeReport;
use crate::model::TrainableModel;
use crate::tokenizer::HfTokenizer;

/// Write the model strategy's artifact plus the tokenizer files
pub fn save_model(model: &dyn TrainableModel, tokenizer: &HfTokenizer, output: &Path) -> Result<()> {
    model.save(output)?;
    tokenizer.save(output)?;
    Ok(())
}

/// Fold a saved adapter in `output` into the base model in `base_dir`
///
/// Returns `None` for full fine-tuning, which has nothing to merge.
pub fn merge_if_adapter(
    model: &dyn TrainableModel,
    base_dir: &Path,
    output: &Path,
) -> Result<Option<MergeReport>> {
    if !model.kind().has_adapter() {
        return Ok(None);
    }
    info!("Merging adapter weights...");
    Ok(model.merge(base_dir, output)?)
}

/// Create the model repo and upload `output` when publishing is requested
pub fn push_to_hub(params: &TrainingParams, output: &Path) -> Result<Option<PublishResult>> {
    if !params.push_to_hub {
        return Ok(None);
    }
    info!("Pushing model to hub...");
    let repo_id = params.repo_id.clone().unwrap_or_default();
    let publisher = HfPublisher::new(PublishConfig::model(
        repo_id,
        params.huggingface_token.clone(),
    ))?;
    let result = publisher.publish_folder(output)?;
    info!("{result}");
    Ok(Some(result))
}

/// Every post-training step, in order
pub fn post_process(
    params: &TrainingParams,
    model: &dyn TrainableModel,
    tokenizer: &HfTokenizer,
    base_dir: &Path,
) -> Result<(Option<MergeReport>, Option<PublishResult>)> {
    let output = Path::new(&params.project_name);
    info!("Finished training, saving model...");
    save_model(model, tokenizer, output)?;
    let merge = merge_if_adapter(model, base_dir, output)?;
    let publish = push_to_hub(params, output)?;
    Ok((merge, publish))
}
