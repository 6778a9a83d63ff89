//! Built-in trainer
//!
//! [`Trainer`] runs epochs of shuffled batches with gradient accumulation,
//! global-norm clipping, a warmup schedule and periodic logging, evaluation
//! and checkpointing. Checkpoints land in `{output_dir}/checkpoint-{step}`
//! together with a [`TrainerState`].

mod checkpoint;
mod core;
mod result;
mod state;
mod train_loop;

pub use checkpoint::{checkpoint_dir, rotate_checkpoints, sorted_checkpoints, CHECKPOINT_PREFIX};
pub use self::core::Trainer;
pub use result::TrainResult;
pub use state::{TrainerState, TRAINER_STATE_FILE};
pub use train_loop::TrainingLoop;
