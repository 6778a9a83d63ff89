//! Optimizers, learning-rate schedules and gradient clipping

mod adamw;
mod clip;
mod optimizer;
mod scheduler;
mod sgd;

pub use adamw::AdamW;
pub use clip::clip_grad_norm;
pub use optimizer::Optimizer;
pub use scheduler::{warmup_steps, LRScheduler, WarmupSchedule};
pub use sgd::SGD;

use crate::config::OptimizerKind;

/// Build the optimizer named by the run configuration
#[must_use]
pub fn build_optimizer(kind: OptimizerKind, lr: f32, weight_decay: f32) -> Box<dyn Optimizer> {
    match kind {
        OptimizerKind::AdamW => Box::new(AdamW::default_params(lr, weight_decay)),
        OptimizerKind::Sgd => Box::new(SGD::new(lr, 0.0, weight_decay)),
    }
}
