//! Model construction for a training run

use std::path::Path;

use tracing::{debug, info};

use super::adapted::LoraModel;
use super::causal_lm::CausalLm;
use super::config::ModelConfig;
use super::error::Result;
use super::full::FullFineTune;
use super::resize::resize_token_embeddings;
use super::trainable::TrainableModel;
use crate::config::TrainingParams;
use crate::io::load_model_tensors;
use crate::lora::{LoraConfig, TargetModuleTable};
use crate::quant::prepare_for_int8_training;
use crate::tokenizer::HfTokenizer;

/// Load the pretrained model in `model_dir` and wrap it in the strategy
/// selected by `use_peft`
///
/// The vocabulary is resized to the tokenizer before adapters are injected.
pub fn build_model(
    params: &TrainingParams,
    model_dir: &Path,
    tokenizer: &HfTokenizer,
    table: &TargetModuleTable,
) -> Result<Box<dyn TrainableModel>> {
    let mut config = ModelConfig::load(model_dir)?;
    info!(
        model_type = config.model_type().unwrap_or("unknown"),
        vocab_size = config.vocab_size().unwrap_or(0),
        hidden_size = config.hidden_size().unwrap_or(0),
        "loaded model config"
    );

    let mut tensors = load_model_tensors(model_dir)?;
    resize_token_embeddings(&mut tensors, &mut config, tokenizer.len())?;

    if !params.use_peft {
        if params.use_int8 {
            debug!("use_int8 only applies to adapter training, ignoring");
        }
        let mut lm = CausalLm::from_tensors(config, tensors, true)?;
        lm.set_seed(params.seed as u64);
        info!("{}", lm.parameter_count());
        return Ok(Box::new(FullFineTune::new(lm)));
    }

    let mut lm = CausalLm::from_tensors(config, tensors, false)?;
    lm.set_seed(params.seed as u64);
    lm.round_base_to_f16();
    if params.use_int8 {
        prepare_for_int8_training(&mut lm)?;
    }
    lm.freeze_base();

    let targets = table.resolve(lm.config().model_type(), params.target_module_list())?;
    let lora = LoraConfig::from_params(params, targets).with_fan_in_fan_out(lm.fan_in_fan_out());
    let adapted = lm.inject_adapters(&lora)?;
    info!(
        r = lora.r,
        alpha = lora.alpha,
        modules = adapted.len(),
        "LoRA adapters attached"
    );
    info!("{}", lm.parameter_count());

    Ok(Box::new(LoraModel::new(
        lm,
        lora,
        Some(params.model_name.clone()),
    )))
}
