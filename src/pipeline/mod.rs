//! End-to-end fine-tuning run
//!
//! Stages, in order: normalize and validate the configuration, fetch the
//! model, load the splits, prepare the tokenizer, preprocess text into
//! blocks, build the model, train, then save, merge and publish.
//!
//! ```no_run
//! use serde_json::json;
//!
//! let summary = afinar::pipeline::train(json!({
//!     "model_name": "gpt2",
//!     "data_path": "./data",
//!     "project_name": "my-run",
//!     "use_peft": true,
//! }))?;
//! println!("{} optimizer steps", summary.train_result.global_step);
//! # Ok::<(), afinar::Error>(())
//! ```

pub mod post;


use std::path::PathBuf;

use tracing::info;

use crate::config::{normalize, ParamsInput, TrainingParams};
use crate::error::Result;
use crate::hf_pipeline::{load_dataset, process_data, HfModelFetcher, PublishResult, TextDataset};
use crate::lora::{MergeReport, TargetModuleTable};
use crate::model::{build_model, ModelKind};
use crate::preprocess::{group_texts, tokenize, LmDataset};
use crate::tokenizer::{prepare_tokenizer, HfTokenizer};
use crate::train::{
    build_callbacks, derive_logging_steps, TrainResult, Trainer, TrainerCallback,
    TrainingArguments, TrainingLoop,
};

pub use post::{merge_if_adapter, post_process, push_to_hub, save_model};

/// What a completed run produced
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub output_dir: PathBuf,
    pub model_kind: ModelKind,
    pub block_size: usize,
    pub train_blocks: usize,
    pub valid_blocks: Option<usize>,
    pub train_result: TrainResult,
    pub merge: Option<MergeReport>,
    pub publish: Option<PublishResult>,
}

/// Run the whole pipeline for one configuration
pub fn train(input: impl Into<ParamsInput>) -> Result<RunSummary> {
    Pipeline::new(normalize(input)?).run()
}

/// A configured run with replaceable collaborators
#[derive(Debug)]
pub struct Pipeline {
    params: TrainingParams,
    fetcher: HfModelFetcher,
    table: TargetModuleTable,
}

impl Pipeline {
    #[must_use]
    pub fn new(params: TrainingParams) -> Self {
        let fetcher = HfModelFetcher::with_token(params.huggingface_token.as_deref());
        Self {
            params,
            fetcher,
            table: TargetModuleTable::default(),
        }
    }

    /// Use a different LoRA target-module table
    #[must_use]
    pub fn with_target_table(mut self, table: TargetModuleTable) -> Self {
        self.table = table;
        self
    }

    #[must_use]
    pub fn params(&self) -> &TrainingParams {
        &self.params
    }

    /// Run with the built-in [`Trainer`]
    pub fn run(&self) -> Result<RunSummary> {
        self.run_with(|args, callbacks| Trainer::new(args, callbacks))
    }

    /// Run with a caller-supplied training loop
    pub fn run_with<L, F>(&self, make_loop: F) -> Result<RunSummary>
    where
        L: TrainingLoop,
        F: FnOnce(TrainingArguments, Vec<Box<dyn TrainerCallback>>) -> L,
    {
        let params = &self.params;
        params.validate()?;
        info!(
            "{}",
            serde_json::to_string(params).unwrap_or_else(|_| format!("{params:?}"))
        );

        let artifact = self.fetcher.fetch_model(&params.model_name)?;
        let token = params.huggingface_token.as_deref();

        let train_data = load_dataset(&params.data_path, &params.train_split, token)?;
        let valid_data = match params.valid_split.as_deref() {
            Some(split) => Some(load_dataset(&params.data_path, split, token)?),
            None => None,
        };

        let tokenizer = prepare_tokenizer(&artifact.path, params.model_max_length)?;
        let resolved = params.resolve(tokenizer.model_max_length());
        let block_size = resolved.block_size();

        let train_blocks = self.preprocess(&train_data, &tokenizer, block_size)?;
        let valid_blocks = valid_data
            .as_ref()
            .map(|data| self.preprocess(data, &tokenizer, block_size))
            .transpose()?;

        let mut model = build_model(params, &artifact.path, &tokenizer, &self.table)?;
        info!("{}", serde_json::Value::Object(model.config().as_json().clone()));

        let logging_steps = derive_logging_steps(
            params.logging_steps,
            train_blocks.len(),
            valid_blocks.as_ref().map(LmDataset::len),
            params.train_batch_size,
        );
        let args = TrainingArguments::from_params(params, logging_steps)?;
        let callbacks = build_callbacks(params.use_peft, params.has_validation());

        info!("creating trainer");
        let mut training_loop = make_loop(args, callbacks);
        model.config_mut().set_use_cache(false);
        let train_result = training_loop.train(model.as_mut(), &train_blocks, valid_blocks.as_ref())?;

        let (merge, publish) = post_process(params, model.as_ref(), &tokenizer, &artifact.path)?;

        Ok(RunSummary {
            output_dir: PathBuf::from(&params.project_name),
            model_kind: model.kind(),
            block_size,
            train_blocks: train_blocks.len(),
            valid_blocks: valid_blocks.as_ref().map(LmDataset::len),
            train_result,
            merge,
            publish,
        })
    }

    /// Text column normalization, tokenization and grouping for one split
    fn preprocess(
        &self,
        data: &TextDataset,
        tokenizer: &HfTokenizer,
        block_size: usize,
    ) -> Result<LmDataset> {
        let params = &self.params;
        let eos = if params.add_eos_token {
            tokenizer.eos_token()
        } else {
            None
        };
        let processed = process_data(data, &params.text_column, eos.as_deref());
        let tokenized = tokenize(&processed, tokenizer, &params.text_column)?;
        Ok(group_texts(&tokenized, block_size)?)
    }
}
