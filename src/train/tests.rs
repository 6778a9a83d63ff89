//! Tests for the training driver

use std::path::{Path, PathBuf};

use super::*;
use crate::config::{IntervalStrategy, OptimizerKind, SchedulerType, TrainingParams, UNSET};
use crate::hf_pipeline::WEIGHTS_FILE;
use crate::lora::{MergeReport, TargetModuleTable, ADAPTER_CONFIG_FILE};
use crate::model::{
    build_model, Batch, ModelConfig, ModelError, ModelKind, ParameterCount, StepOutput,
    TrainableModel,
};
use crate::parameter::Parameter;
use crate::preprocess::{LmBlock, LmDataset};
use crate::testing::TinyModel;
use crate::tokenizer::HfTokenizer;
use proptest::prelude::*;
use tempfile::TempDir;

fn block(ids: &[u32]) -> LmBlock {
    LmBlock {
        input_ids: ids.to_vec(),
        attention_mask: vec![1; ids.len()],
        labels: ids.to_vec(),
    }
}

/// `n` blocks of 4 tokens cycling through the tiny vocabulary
fn dataset(split: &str, n: usize) -> LmDataset {
    let sentence = [2u32, 3, 4, 5, 2, 6, 1];
    let stream: Vec<u32> = sentence.iter().copied().cycle().take(n * 4).collect();
    LmDataset {
        split: split.to_string(),
        block_size: 4,
        blocks: stream.chunks(4).map(block).collect(),
    }
}

fn mean_loss(model: &mut dyn TrainableModel, data: &LmDataset) -> f32 {
    let blocks: Vec<&LmBlock> = data.blocks.iter().collect();
    let batch = default_data_collator(&blocks).unwrap();
    model.eval_loss(&batch).unwrap().loss
}

fn run_params(model_dir: &Path, output: &Path) -> TrainingParams {
    let mut params = TrainingParams::new(model_dir.to_str().unwrap(), "data")
        .with_project_name(output.to_str().unwrap())
        .with_block_size(4);
    params.learning_rate = 0.05;
    params.num_train_epochs = 4;
    params.warmup_ratio = 0.0;
    params
}

fn build(model_dir: &Path, params: &TrainingParams) -> Box<dyn TrainableModel> {
    let tokenizer = HfTokenizer::from_dir(model_dir).unwrap();
    build_model(params, model_dir, &tokenizer, &TargetModuleTable::default()).unwrap()
}

fn checkpoint_names(output: &Path) -> Vec<String> {
    sorted_checkpoints(output, None)
        .unwrap()
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect()
}

// ========================================================================
// PROPERTY TESTS
// ========================================================================

proptest! {
    #![proptest_config(proptest::test_runner::Config::with_cases(200))]

    #[test]
    fn prop_derived_logging_steps_never_zero(
        train_len in 0usize..100_000,
        valid_len in proptest::option::of(0usize..100_000),
        batch_size in 1usize..512,
    ) {
        let steps = derive_logging_steps(UNSET, train_len, valid_len, batch_size);
        prop_assert!(steps >= 1);
        let len = valid_len.unwrap_or(train_len);
        prop_assert_eq!(steps, ((0.2 * len as f64 / batch_size as f64) as usize).max(1));
    }

    #[test]
    fn prop_epoch_batches_cover_every_index_once(
        len in 0usize..200,
        batch_size in 1usize..32,
        seed in any::<u64>(),
    ) {
        use rand::SeedableRng;
        let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
        let batches = epoch_batches(len, batch_size, Some(&mut rng));
        prop_assert_eq!(batches.len(), len.div_ceil(batch_size));
        prop_assert!(batches.iter().all(|b| !b.is_empty() && b.len() <= batch_size));
        let mut seen: Vec<usize> = batches.into_iter().flatten().collect();
        seen.sort_unstable();
        prop_assert_eq!(seen, (0..len).collect::<Vec<_>>());
    }
}

// ========================================================================
// ARGUMENTS
// ========================================================================

#[test]
fn test_configured_logging_steps_pass_through() {
    assert_eq!(derive_logging_steps(25, 10, Some(1000), 2), 25);
    assert_eq!(derive_logging_steps(UNSET, 1000, None, 8), 25);
    assert_eq!(derive_logging_steps(UNSET, 1000, Some(100), 8), 2);
    assert_eq!(derive_logging_steps(UNSET, 3, None, 8), 1);
}

#[test]
fn test_ten_records_without_validation_disable_evaluation() {
    let params = TrainingParams::new("gpt2", "data").with_block_size(4);
    assert_eq!(params.train_batch_size, 2);
    let logging_steps = derive_logging_steps(params.logging_steps, 10, None, params.train_batch_size);
    let args = TrainingArguments::from_params(&params, logging_steps).unwrap();

    assert_eq!(args.evaluation_strategy, IntervalStrategy::No);
    assert!(!args.eval_enabled());
    assert!(!args.load_best_model_at_end);
    assert_eq!(args.logging_steps, 1);

    let peft = params.clone().with_lora(8, 16.0);
    let callbacks = build_callbacks(peft.use_peft, peft.has_validation());
    let names: Vec<&str> = callbacks.iter().map(|cb| cb.name()).collect();
    assert_eq!(names, vec!["SaveAdapterCallback"]);
}

#[test]
fn test_arguments_mirror_params() {
    let mut params = TrainingParams::new("gpt2", "data")
        .with_project_name("my-run")
        .with_valid_split("validation");
    params.scheduler = "cosine".into();
    params.optimizer = "sgd".into();
    params.fp16 = true;
    params.push_to_hub = true;
    params.repo_id = Some("someone/model".into());

    let args = TrainingArguments::from_params(&params, 7).unwrap();
    assert_eq!(args.output_dir, PathBuf::from("my-run"));
    assert_eq!(args.evaluation_strategy, IntervalStrategy::Epoch);
    assert!(args.load_best_model_at_end);
    assert_eq!(args.lr_scheduler_type, SchedulerType::Cosine);
    assert_eq!(args.optim, OptimizerKind::Sgd);
    assert_eq!(args.report_to, REPORT_TO);
    assert!(args.fp16);
    assert!(!args.push_to_hub);
    assert_eq!(args.logging_steps, 7);

    let json = serde_json::to_value(&args).unwrap();
    assert_eq!(json["evaluation_strategy"], "epoch");
    assert_eq!(json["report_to"], "tensorboard");
}

#[test]
fn test_best_model_reload_needs_matching_strategies() {
    let mut params = TrainingParams::new("gpt2", "data").with_valid_split("validation");
    params.save_strategy = "steps".into();
    match TrainingArguments::from_params(&params, 5) {
        Err(TrainError::InvalidArguments(msg)) => assert!(msg.contains("save_strategy=steps")),
        other => panic!("expected InvalidArguments, got {other:?}"),
    }

    // Without a validation split evaluation is off and nothing is reloaded
    let mut params = TrainingParams::new("gpt2", "data");
    params.save_strategy = "steps".into();
    TrainingArguments::from_params(&params, 5).unwrap();
}

#[test]
fn test_unknown_optimizer_and_scheduler() {
    let mut params = TrainingParams::new("gpt2", "data");
    params.optimizer = "lion".into();
    assert!(matches!(
        TrainingArguments::from_params(&params, 1),
        Err(TrainError::UnknownOptimizer(name)) if name == "lion"
    ));

    let mut params = TrainingParams::new("gpt2", "data");
    params.scheduler = "polynomial".into();
    assert!(matches!(
        TrainingArguments::from_params(&params, 1),
        Err(TrainError::UnknownScheduler(_))
    ));
}

#[test]
fn test_full_fine_tune_registers_no_adapter_callbacks() {
    assert!(build_callbacks(false, false).is_empty());
    assert!(build_callbacks(false, true).is_empty());
    let names: Vec<&str> = build_callbacks(true, true).iter().map(|cb| cb.name()).collect();
    assert_eq!(names, vec!["SaveAdapterCallback", "LoadBestAdapterCallback"]);
}

// ========================================================================
// COLLATION
// ========================================================================

#[test]
fn test_collator_stacks_rows() {
    let a = block(&[1, 2, 3]);
    let b = block(&[4, 5, 6]);
    let batch = default_data_collator(&[&a, &b]).unwrap();
    assert_eq!(batch.batch_size(), 2);
    assert_eq!(batch.seq_len(), 3);
    assert_eq!(batch.input_ids[[1, 0]], 4);
    assert_eq!(batch.labels, batch.input_ids);
}

#[test]
fn test_collator_rejects_ragged_and_empty() {
    let a = block(&[1, 2, 3]);
    let b = block(&[4, 5]);
    assert!(default_data_collator(&[&a, &b]).is_err());
    assert!(default_data_collator(&[]).is_err());
}

#[test]
fn test_unshuffled_batches_are_sequential() {
    assert_eq!(
        epoch_batches(5, 2, None),
        vec![vec![0, 1], vec![2, 3], vec![4]]
    );
}

// ========================================================================
// CHECKPOINT ROTATION
// ========================================================================

fn make_checkpoints(dir: &Path, steps: &[usize]) {
    for &step in steps {
        std::fs::create_dir_all(checkpoint_dir(dir, step)).unwrap();
    }
    std::fs::create_dir_all(dir.join("runs")).unwrap();
    std::fs::write(dir.join("checkpoint-notes.txt"), "x").unwrap();
}

#[test]
fn test_checkpoints_sort_numerically() {
    let dir = TempDir::new().unwrap();
    make_checkpoints(dir.path(), &[10, 2, 100]);
    assert_eq!(
        checkpoint_names(dir.path()),
        vec!["checkpoint-2", "checkpoint-10", "checkpoint-100"]
    );
}

#[test]
fn test_rotation_keeps_newest() {
    let dir = TempDir::new().unwrap();
    make_checkpoints(dir.path(), &[1, 2, 3, 4, 5]);
    let deleted = rotate_checkpoints(dir.path(), 2, None).unwrap();
    assert_eq!(deleted.len(), 3);
    assert_eq!(checkpoint_names(dir.path()), vec!["checkpoint-4", "checkpoint-5"]);
}

#[test]
fn test_rotation_protects_best() {
    let dir = TempDir::new().unwrap();
    make_checkpoints(dir.path(), &[1, 2, 3, 4, 5]);
    let best = checkpoint_dir(dir.path(), 2);
    rotate_checkpoints(dir.path(), 2, Some(&best)).unwrap();
    assert_eq!(checkpoint_names(dir.path()), vec!["checkpoint-2", "checkpoint-5"]);
}

#[test]
fn test_rotation_limit_one_keeps_best_and_latest() {
    let dir = TempDir::new().unwrap();
    make_checkpoints(dir.path(), &[1, 2, 3]);
    let best = checkpoint_dir(dir.path(), 1);
    rotate_checkpoints(dir.path(), 1, Some(&best)).unwrap();
    assert_eq!(checkpoint_names(dir.path()), vec!["checkpoint-1", "checkpoint-3"]);

    let latest = checkpoint_dir(dir.path(), 3);
    rotate_checkpoints(dir.path(), 1, Some(&latest)).unwrap();
    assert_eq!(checkpoint_names(dir.path()), vec!["checkpoint-3"]);
}

#[test]
fn test_zero_limit_keeps_everything() {
    let dir = TempDir::new().unwrap();
    make_checkpoints(dir.path(), &[1, 2, 3]);
    assert!(rotate_checkpoints(dir.path(), 0, None).unwrap().is_empty());
    assert_eq!(checkpoint_names(dir.path()).len(), 3);
}

#[test]
fn test_trainer_state_roundtrip_and_best_tracking() {
    let dir = TempDir::new().unwrap();
    let mut state = TrainerState {
        global_step: 12,
        ..TrainerState::default()
    };
    assert!(state.observe_metric(2.0, Path::new("checkpoint-4")));
    assert!(!state.observe_metric(2.5, Path::new("checkpoint-8")));
    assert!(state.observe_metric(1.5, Path::new("checkpoint-12")));
    assert_eq!(state.best_model_checkpoint.as_deref(), Some(Path::new("checkpoint-12")));

    state.save(dir.path()).unwrap();
    assert_eq!(TrainerState::load(dir.path()).unwrap(), state);
}

// ========================================================================
// TRAINING LOOP
// ========================================================================

#[test]
fn test_trainer_registers_builtin_callbacks_first() {
    let params = TrainingParams::new("gpt2", "data").with_valid_split("validation");
    let args = TrainingArguments::from_params(&params, 1).unwrap();
    let trainer = Trainer::new(args, build_callbacks(true, true));
    assert_eq!(
        trainer.callbacks().names(),
        vec![
            "ProgressCallback",
            "MetricsLog",
            "SaveAdapterCallback",
            "LoadBestAdapterCallback"
        ]
    );
}

#[test]
fn test_full_training_reduces_loss_and_rotates_checkpoints() {
    let model_dir = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    TinyModel::default().write(model_dir.path());
    let params = run_params(model_dir.path(), output.path());
    let mut model = build(model_dir.path(), &params);
    let train = dataset("train", 10);

    let before = mean_loss(model.as_mut(), &train);
    let logging_steps = derive_logging_steps(params.logging_steps, train.len(), None, 2);
    let args = TrainingArguments::from_params(&params, logging_steps).unwrap();
    let mut trainer = Trainer::new(args, build_callbacks(false, false));
    let result = trainer.train(model.as_mut(), &train, None).unwrap();
    let after = mean_loss(model.as_mut(), &train);

    assert_eq!(result.global_step, 4 * 5);
    assert_eq!(result.epochs_completed, 4);
    assert!(!result.stopped_early);
    assert!(result.best_model_checkpoint.is_none());
    assert!(after < before, "loss went from {before} to {after}");

    assert_eq!(checkpoint_names(output.path()), vec!["checkpoint-20"]);
    let last = checkpoint_dir(output.path(), 20);
    assert!(last.join(WEIGHTS_FILE).is_file());
    let state = TrainerState::load(&last).unwrap();
    assert_eq!(state.global_step, 20);
    assert_eq!(state.log_history.len(), 20);

    let runs: Vec<_> = std::fs::read_dir(output.path().join("runs")).unwrap().collect();
    assert_eq!(runs.len(), 1);
}

#[test]
fn test_gradient_accumulation_counts_optimizer_steps() {
    let model_dir = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    TinyModel::default().write(model_dir.path());
    let mut params = run_params(model_dir.path(), output.path());
    params.gradient_accumulation_steps = 2;
    params.num_train_epochs = 1;
    params.save_strategy = "no".into();
    let mut model = build(model_dir.path(), &params);

    let args = TrainingArguments::from_params(&params, 1).unwrap();
    let mut trainer = Trainer::new(args, Vec::new());
    let result = trainer.train(model.as_mut(), &dataset("train", 10), None).unwrap();

    // five batches of two make three optimizer steps
    assert_eq!(result.global_step, 3);
    assert_eq!(trainer.state().max_steps, 3);
    assert!(checkpoint_names(output.path()).is_empty());
}

#[test]
fn test_lora_training_keeps_adapter_checkpoints_and_reloads_best() {
    let model_dir = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    TinyModel::default().write(model_dir.path());
    let params = run_params(model_dir.path(), output.path())
        .with_lora(2, 4.0)
        .with_valid_split("validation");
    let mut model = build(model_dir.path(), &params);
    assert_eq!(model.kind(), ModelKind::Lora);

    let train = dataset("train", 10);
    let valid = dataset("validation", 4);
    let before = mean_loss(model.as_mut(), &valid);

    let args = TrainingArguments::from_params(&params, 5).unwrap();
    assert!(args.load_best_model_at_end);
    let mut trainer = Trainer::new(args, build_callbacks(true, true));
    let result = trainer.train(model.as_mut(), &train, Some(&valid)).unwrap();

    let best = result.best_model_checkpoint.clone().unwrap();
    let best_metric = result.best_metric.unwrap();
    assert!(best.join("adapter_model").join(ADAPTER_CONFIG_FILE).is_file());
    assert!(!best.join(WEIGHTS_FILE).exists());
    assert!(best_metric < before);

    // the model now carries the best adapter
    let reloaded = mean_loss(model.as_mut(), &valid);
    approx::assert_abs_diff_eq!(reloaded, best_metric, epsilon = 1e-4);

    let kept = checkpoint_names(output.path());
    assert!(!kept.is_empty() && kept.len() <= 2);
    assert!(kept.contains(&best.file_name().unwrap().to_string_lossy().into_owned()));
}

#[test]
fn test_evaluation_without_dataset_is_rejected() {
    let output = TempDir::new().unwrap();
    let params = TrainingParams::new("m", "d")
        .with_project_name(output.path().to_str().unwrap())
        .with_valid_split("validation");
    let args = TrainingArguments::from_params(&params, 1).unwrap();
    let mut trainer = Trainer::new(args, Vec::new());
    let mut model = CountingModel::new(usize::MAX);
    assert!(matches!(
        trainer.train(&mut model, &dataset("train", 2), None),
        Err(TrainError::InvalidArguments(_))
    ));
    assert!(matches!(
        trainer.train(&mut model, &LmDataset::default(), None),
        Err(TrainError::InvalidArguments(_))
    ));
}

// ========================================================================
// AUTO BATCH SIZE
// ========================================================================

/// One-weight model that runs out of memory above a batch size
struct CountingModel {
    config: ModelConfig,
    weight: Parameter,
    max_batch: usize,
    seen: Vec<usize>,
}

impl CountingModel {
    fn new(max_batch: usize) -> Self {
        Self {
            config: ModelConfig::default(),
            weight: Parameter::zeros("w", &[1], true),
            max_batch,
            seen: Vec::new(),
        }
    }
}

impl TrainableModel for CountingModel {
    fn kind(&self) -> ModelKind {
        ModelKind::FullFineTune
    }

    fn config(&self) -> &ModelConfig {
        &self.config
    }

    fn config_mut(&mut self) -> &mut ModelConfig {
        &mut self.config
    }

    fn trainable_parameters(&mut self) -> Vec<&mut Parameter> {
        vec![&mut self.weight]
    }

    fn num_parameters(&self) -> ParameterCount {
        ParameterCount {
            total: 1,
            trainable: 1,
        }
    }

    fn forward_backward(
        &mut self,
        batch: &Batch,
        grad_scale: f32,
    ) -> crate::model::Result<StepOutput> {
        self.seen.push(batch.batch_size());
        if batch.batch_size() > self.max_batch {
            return Err(ModelError::ResourceExhausted {
                what: "logits".into(),
                bytes: usize::MAX,
            });
        }
        let grad = ndarray::ArrayD::from_elem(ndarray::IxDyn(&[1]), grad_scale);
        self.weight.accumulate_grad(&grad)?;
        Ok(StepOutput {
            loss: 1.0,
            num_tokens: batch.num_targets(),
        })
    }

    fn eval_loss(&mut self, batch: &Batch) -> crate::model::Result<StepOutput> {
        Ok(StepOutput {
            loss: 1.0,
            num_tokens: batch.num_targets(),
        })
    }

    fn save(&self, _dir: &Path) -> crate::model::Result<()> {
        Ok(())
    }

    fn save_checkpoint(&self, _dir: &Path) -> crate::model::Result<()> {
        Ok(())
    }

    fn load_checkpoint(&mut self, _dir: &Path) -> crate::model::Result<()> {
        Ok(())
    }

    fn save_adapter(&self, _dir: &Path) -> crate::model::Result<bool> {
        Ok(false)
    }

    fn load_adapter(&mut self, _dir: &Path) -> crate::model::Result<bool> {
        Ok(false)
    }

    fn merge(&self, _base: &Path, _target: &Path) -> crate::model::Result<Option<MergeReport>> {
        Ok(None)
    }
}

fn batch_params(output: &Path, batch_size: usize, auto: bool) -> TrainingArguments {
    let mut params = TrainingParams::new("m", "d").with_project_name(output.to_str().unwrap());
    params.train_batch_size = batch_size;
    params.auto_find_batch_size = auto;
    params.num_train_epochs = 1;
    params.save_strategy = "no".into();
    TrainingArguments::from_params(&params, 1).unwrap()
}

#[test]
fn test_auto_find_batch_size_halves_until_it_fits() {
    let output = TempDir::new().unwrap();
    let mut trainer = Trainer::new(batch_params(output.path(), 8, true), Vec::new());
    let mut model = CountingModel::new(2);
    let result = trainer.train(&mut model, &dataset("train", 10), None).unwrap();

    assert_eq!(result.train_batch_size, 2);
    assert_eq!(result.global_step, 5);
    assert_eq!(&model.seen[..2], &[8, 4]);
    assert_eq!(trainer.state().train_batch_size, 2);
}

#[test]
fn test_resource_exhaustion_propagates_without_auto_find() {
    let output = TempDir::new().unwrap();
    let mut trainer = Trainer::new(batch_params(output.path(), 8, false), Vec::new());
    let mut model = CountingModel::new(2);
    let err = trainer.train(&mut model, &dataset("train", 10), None).unwrap_err();
    assert!(err.is_resource_exhausted());
    assert_eq!(model.seen, vec![8]);
}

#[test]
fn test_stop_from_callback_ends_training() {
    struct StopAfterFirstStep;
    impl TrainerCallback for StopAfterFirstStep {
        fn on_step_end(&mut self, _ctx: &CallbackContext) -> CallbackAction {
            CallbackAction::Stop
        }
    }

    let output = TempDir::new().unwrap();
    let mut trainer = Trainer::new(batch_params(output.path(), 2, false), Vec::new());
    trainer.add_callback(StopAfterFirstStep);
    let mut model = CountingModel::new(8);
    let result = trainer.train(&mut model, &dataset("train", 10), None).unwrap();
    assert!(result.stopped_early);
    assert_eq!(result.global_step, 1);
    assert_eq!(result.epochs_completed, 0);
}

#[test]
fn test_train_end_reports_last_completed_epoch() {
    use std::sync::{Arc, Mutex};

    struct RecordEnd(Arc<Mutex<Option<usize>>>);
    impl TrainerCallback for RecordEnd {
        fn on_train_end(
            &mut self,
            ctx: &CallbackContext,
            _model: &mut dyn TrainableModel,
        ) -> Result<()> {
            *self.0.lock().unwrap() = Some(ctx.epoch);
            Ok(())
        }
    }

    let output = TempDir::new().unwrap();
    let mut args = batch_params(output.path(), 2, false);
    args.num_train_epochs = 3;
    let seen = Arc::new(Mutex::new(None));
    let mut trainer = Trainer::new(args, Vec::new());
    trainer.add_callback(RecordEnd(Arc::clone(&seen)));
    let mut model = CountingModel::new(8);
    let result = trainer.train(&mut model, &dataset("train", 4), None).unwrap();

    assert_eq!(result.epochs_completed, 3);
    assert_eq!(result.global_step, 6);
    assert_eq!(*seen.lock().unwrap(), Some(2));
}
