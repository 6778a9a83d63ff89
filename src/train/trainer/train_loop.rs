//! The training loop itself

use std::path::{Path, PathBuf};
use std::time::Instant;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{info, warn};

use super::checkpoint::{checkpoint_dir, rotate_checkpoints};
use super::core::Trainer;
use super::result::TrainResult;
use super::state::TrainerState;
use crate::config::IntervalStrategy;
use crate::hf_pipeline::WEIGHTS_FILE;
use crate::model::{Batch, TrainableModel};
use crate::optim::{
    build_optimizer, clip_grad_norm, warmup_steps, LRScheduler, WarmupSchedule,
};
use crate::preprocess::{LmBlock, LmDataset};
use crate::train::callback::{CallbackAction, LogEntry};
use crate::train::collator::{default_data_collator, epoch_batches};
use crate::train::error::{Result, TrainError};

/// Seam for driving a model through training
///
/// [`Trainer`] is the built-in implementation; callers with their own loop
/// implement this to slot into the pipeline.
pub trait TrainingLoop {
    fn train(
        &mut self,
        model: &mut dyn TrainableModel,
        train: &LmDataset,
        eval: Option<&LmDataset>,
    ) -> Result<TrainResult>;
}

fn collate(dataset: &LmDataset, indices: &[usize]) -> Result<Batch> {
    let blocks: Vec<&LmBlock> = indices.iter().map(|&i| &dataset.blocks[i]).collect();
    default_data_collator(&blocks)
}

/// Running mean of step losses
#[derive(Debug, Default, Clone, Copy)]
struct LossTracker {
    sum: f64,
    count: usize,
}

impl LossTracker {
    fn push(&mut self, loss: f32) {
        self.sum += f64::from(loss);
        self.count += 1;
    }

    fn mean(&self) -> f32 {
        if self.count == 0 {
            0.0
        } else {
            (self.sum / self.count as f64) as f32
        }
    }

    fn take(&mut self) -> Option<f32> {
        let mean = (self.count > 0).then(|| self.mean());
        *self = Self::default();
        mean
    }
}

impl TrainingLoop for Trainer {
    fn train(
        &mut self,
        model: &mut dyn TrainableModel,
        train: &LmDataset,
        eval: Option<&LmDataset>,
    ) -> Result<TrainResult> {
        if train.is_empty() {
            return Err(TrainError::InvalidArguments(format!(
                "the '{}' split produced no blocks of {} tokens",
                train.split, train.block_size
            )));
        }
        let eval = if self.args.eval_enabled() {
            match eval {
                Some(ds) if !ds.is_empty() => Some(ds),
                Some(ds) => {
                    return Err(TrainError::InvalidArguments(format!(
                        "the '{}' split produced no blocks of {} tokens",
                        ds.split, ds.block_size
                    )))
                }
                None => {
                    return Err(TrainError::InvalidArguments(format!(
                        "evaluation_strategy={} requires an evaluation dataset",
                        self.args.evaluation_strategy
                    )))
                }
            }
        } else {
            None
        };

        let mut batch_size = self.args.per_device_train_batch_size;
        loop {
            match self.run(model, train, eval, batch_size) {
                Err(e) if self.args.auto_find_batch_size && e.is_resource_exhausted() => {
                    if batch_size <= 1 {
                        return Err(e);
                    }
                    let halved = batch_size / 2;
                    warn!(
                        from = batch_size,
                        to = halved,
                        error = %e,
                        "reducing train batch size and restarting training"
                    );
                    batch_size = halved;
                }
                other => return other,
            }
        }
    }
}

impl Trainer {
    fn run(
        &mut self,
        model: &mut dyn TrainableModel,
        train: &LmDataset,
        eval: Option<&LmDataset>,
        batch_size: usize,
    ) -> Result<TrainResult> {
        let args = self.args.clone();
        let mut rng = StdRng::seed_from_u64(args.seed);

        let num_batches = train.len().div_ceil(batch_size);
        let accumulation = args.gradient_accumulation_steps;
        let steps_per_epoch = num_batches.div_ceil(accumulation).max(1);
        let max_steps = steps_per_epoch * args.num_train_epochs;

        let learning_rate = args.learning_rate as f32;
        let mut optimizer = build_optimizer(args.optim, learning_rate, args.weight_decay as f32);
        let mut schedule = WarmupSchedule::new(
            args.lr_scheduler_type,
            learning_rate,
            warmup_steps(args.warmup_ratio, max_steps),
            max_steps,
        );
        schedule.apply(optimizer.as_mut());
        optimizer.zero_grad(&mut model.trainable_parameters());

        self.state = TrainerState {
            max_steps,
            num_train_epochs: args.num_train_epochs,
            logging_steps: args.logging_steps,
            train_batch_size: batch_size,
            ..TrainerState::default()
        };
        self.last_eval_loss = None;
        self.start_time = Some(Instant::now());

        let count = model.num_parameters();
        info!(
            num_examples = train.len(),
            num_epochs = args.num_train_epochs,
            batch_size,
            gradient_accumulation_steps = accumulation,
            total_optimization_steps = max_steps,
            "{count}"
        );

        let mut stopped = false;
        let ctx = self.build_context(0, 0, steps_per_epoch, 0.0, schedule.get_lr());
        if self.callbacks.on_train_begin(&ctx) == CallbackAction::Stop {
            stopped = true;
        }

        let mut window = LossTracker::default();
        let mut total = LossTracker::default();
        let mut epochs_completed: usize = 0;

        for epoch in 0..args.num_train_epochs {
            if stopped {
                break;
            }
            let ctx = self.build_context(epoch, 0, steps_per_epoch, total.mean(), schedule.get_lr());
            match self.callbacks.on_epoch_begin(&ctx) {
                CallbackAction::Stop => break,
                CallbackAction::SkipEpoch => continue,
                CallbackAction::Continue => {}
            }

            let batches = epoch_batches(train.len(), batch_size, Some(&mut rng));
            let mut step_loss = 0.0f32;
            let mut step_in_epoch = 0;

            for (i, indices) in batches.iter().enumerate() {
                let window_start = (i / accumulation) * accumulation;
                let window_len = accumulation.min(num_batches - window_start);
                let grad_scale = 1.0 / window_len as f32;

                let batch = collate(train, indices)?;
                let output = model.forward_backward(&batch, grad_scale)?;
                step_loss += output.loss * grad_scale;

                let boundary = (i + 1) % accumulation == 0 || i + 1 == num_batches;
                if !boundary {
                    continue;
                }

                let lr = schedule.get_lr();
                let grad_norm = {
                    let mut params = model.trainable_parameters();
                    let norm = clip_grad_norm(&mut params, args.max_grad_norm as f32);
                    schedule.apply(optimizer.as_mut());
                    optimizer.step(&mut params);
                    optimizer.zero_grad(&mut params);
                    norm
                };
                schedule.step();

                self.state.global_step += 1;
                step_in_epoch += 1;
                self.state.epoch = epoch as f64 + step_in_epoch as f64 / steps_per_epoch as f64;
                let loss = step_loss;
                window.push(loss);
                total.push(loss);
                step_loss = 0.0;

                let ctx = self.build_context(epoch, step_in_epoch, steps_per_epoch, loss, lr);
                if self.callbacks.on_step_end(&ctx) == CallbackAction::Stop {
                    stopped = true;
                }

                let at_interval = self.state.global_step % args.logging_steps == 0;
                if at_interval {
                    let entry = LogEntry {
                        global_step: self.state.global_step,
                        epoch: self.state.epoch,
                        loss: window.take(),
                        learning_rate: Some(lr),
                        grad_norm: Some(grad_norm),
                        eval_loss: None,
                    };
                    self.log(&entry, epoch, step_in_epoch, steps_per_epoch, lr)?;
                }
                if at_interval && args.evaluation_strategy == IntervalStrategy::Steps {
                    if let Some(eval) = eval {
                        self.evaluate(model, eval, epoch, step_in_epoch, steps_per_epoch, lr)?;
                    }
                }
                if at_interval && args.save_strategy == IntervalStrategy::Steps {
                    self.save(model, epoch, step_in_epoch, steps_per_epoch, lr)?;
                }
                if stopped {
                    break;
                }
            }

            let lr = schedule.get_lr();
            if args.evaluation_strategy == IntervalStrategy::Epoch {
                if let Some(eval) = eval {
                    self.evaluate(model, eval, epoch, step_in_epoch, steps_per_epoch, lr)?;
                }
            }
            if args.save_strategy == IntervalStrategy::Epoch {
                self.save(model, epoch, step_in_epoch, steps_per_epoch, lr)?;
            }
            if !stopped {
                epochs_completed += 1;
            }

            let ctx = self.build_context(epoch, step_in_epoch, steps_per_epoch, total.mean(), lr);
            if self.callbacks.on_epoch_end(&ctx) == CallbackAction::Stop {
                stopped = true;
            }
        }

        if args.load_best_model_at_end {
            self.load_best_model(model)?;
        }

        let elapsed_secs = self.start_time.map_or(0.0, |t| t.elapsed().as_secs_f64());
        let ctx = self.build_context(
            epochs_completed.saturating_sub(1),
            0,
            steps_per_epoch,
            total.mean(),
            schedule.get_lr(),
        );
        self.callbacks.on_train_end(&ctx, model)?;

        info!(
            global_step = self.state.global_step,
            train_loss = total.mean(),
            train_runtime = elapsed_secs,
            "Training completed"
        );

        Ok(TrainResult {
            global_step: self.state.global_step,
            epochs_completed,
            training_loss: total.mean(),
            best_metric: self.state.best_metric,
            best_model_checkpoint: self.state.best_model_checkpoint.clone(),
            train_batch_size: batch_size,
            stopped_early: stopped,
            elapsed_secs,
        })
    }

    fn log(
        &mut self,
        entry: &LogEntry,
        epoch: usize,
        step: usize,
        steps_per_epoch: usize,
        lr: f32,
    ) -> Result<()> {
        self.state.log_history.push(entry.clone());
        let ctx = self.build_context(epoch, step, steps_per_epoch, entry.loss.unwrap_or(0.0), lr);
        self.callbacks.on_log(&ctx, entry)
    }

    /// Mean validation loss over all predicted tokens
    fn evaluate(
        &mut self,
        model: &mut dyn TrainableModel,
        eval: &LmDataset,
        epoch: usize,
        step: usize,
        steps_per_epoch: usize,
        lr: f32,
    ) -> Result<f32> {
        let mut weighted = 0.0f64;
        let mut tokens = 0usize;
        for indices in epoch_batches(eval.len(), self.args.per_device_eval_batch_size, None) {
            let batch = collate(eval, &indices)?;
            let output = model.eval_loss(&batch)?;
            weighted += f64::from(output.loss) * output.num_tokens as f64;
            tokens += output.num_tokens;
        }
        let eval_loss = if tokens == 0 {
            0.0
        } else {
            (weighted / tokens as f64) as f32
        };
        self.last_eval_loss = Some(eval_loss);

        let entry = LogEntry {
            global_step: self.state.global_step,
            epoch: self.state.epoch,
            eval_loss: Some(eval_loss),
            ..LogEntry::default()
        };
        self.log(&entry, epoch, step, steps_per_epoch, lr)?;
        let ctx = self.build_context(epoch, step, steps_per_epoch, 0.0, lr);
        self.callbacks.on_evaluate(&ctx);
        Ok(eval_loss)
    }

    fn save(
        &mut self,
        model: &mut dyn TrainableModel,
        epoch: usize,
        step: usize,
        steps_per_epoch: usize,
        lr: f32,
    ) -> Result<PathBuf> {
        let dir = checkpoint_dir(&self.args.output_dir, self.state.global_step);
        info!(path = %dir.display(), "Saving model checkpoint");
        model.save_checkpoint(&dir)?;

        if self.args.load_best_model_at_end {
            if let Some(metric) = self.last_eval_loss {
                self.state.observe_metric(metric, &dir);
            }
        }
        self.state.save(&dir)?;

        let ctx = self.build_context(epoch, step, steps_per_epoch, 0.0, lr);
        self.callbacks.on_save(&ctx, &dir, model)?;

        let best = if self.args.load_best_model_at_end {
            self.state.best_model_checkpoint.clone()
        } else {
            None
        };
        rotate_checkpoints(&self.args.output_dir, self.args.save_total_limit, best.as_deref())?;
        Ok(dir)
    }

    fn load_best_model(&mut self, model: &mut dyn TrainableModel) -> Result<()> {
        let Some(best) = self.state.best_model_checkpoint.clone() else {
            return Ok(());
        };
        if has_weights(&best) {
            info!(
                checkpoint = %best.display(),
                score = ?self.state.best_metric,
                "Loading best model"
            );
            model.load_checkpoint(&best)?;
        } else {
            warn!(
                path = %best.display(),
                "Could not locate the best model weights, keeping the final weights"
            );
        }
        Ok(())
    }
}

fn has_weights(checkpoint: &Path) -> bool {
    checkpoint.join(WEIGHTS_FILE).is_file()
}
