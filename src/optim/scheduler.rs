//! Learning rate schedulers
//!
//! Warmup-then-decay schedules over optimizer steps. The multiplier at
//! step `t` with `w` warmup steps out of `T` total:
//!
//! - `linear`: `t / w` during warmup, then `(T - t) / (T - w)`
//! - `cosine`: `t / w` during warmup, then `0.5 * (1 + cos(π * progress))`
//! - `constant`: `1`
//! - `constant_with_warmup`: `t / w` during warmup, then `1`

use std::f32::consts::PI;

use super::Optimizer;
use crate::config::SchedulerType;

/// Learning rate scheduler trait
pub trait LRScheduler {
    /// Get the current learning rate
    fn get_lr(&self) -> f32;

    /// Step the scheduler (called after each optimizer step)
    fn step(&mut self);
}

/// Warmup steps for a run: `ceil(ratio * total)`
#[must_use]
pub fn warmup_steps(warmup_ratio: f64, total_steps: usize) -> usize {
    (warmup_ratio * total_steps as f64).ceil() as usize
}

/// Schedule selected by [`SchedulerType`]
#[derive(Debug, Clone)]
pub struct WarmupSchedule {
    kind: SchedulerType,
    base_lr: f32,
    warmup_steps: usize,
    total_steps: usize,
    current_step: usize,
}

impl WarmupSchedule {
    pub fn new(kind: SchedulerType, base_lr: f32, warmup_steps: usize, total_steps: usize) -> Self {
        Self {
            kind,
            base_lr,
            warmup_steps,
            total_steps,
            current_step: 0,
        }
    }

    /// Multiplier applied to the base learning rate at `step`
    #[must_use]
    pub fn factor(&self, step: usize) -> f32 {
        let warmup = matches!(
            self.kind,
            SchedulerType::Linear | SchedulerType::Cosine | SchedulerType::ConstantWithWarmup
        );
        if warmup && step < self.warmup_steps {
            return step as f32 / self.warmup_steps.max(1) as f32;
        }
        let decay_span = self.total_steps.saturating_sub(self.warmup_steps).max(1) as f32;
        let progress = step.saturating_sub(self.warmup_steps) as f32 / decay_span;
        match self.kind {
            SchedulerType::Linear => (1.0 - progress).max(0.0),
            SchedulerType::Cosine => (0.5 * (1.0 + (PI * progress).cos())).max(0.0),
            SchedulerType::Constant | SchedulerType::ConstantWithWarmup => 1.0,
        }
    }

    /// Apply the current learning rate to an optimizer
    pub fn apply(&self, optimizer: &mut dyn Optimizer) {
        optimizer.set_lr(self.get_lr());
    }

    #[must_use]
    pub fn current_step(&self) -> usize {
        self.current_step
    }
}

impl LRScheduler for WarmupSchedule {
    fn get_lr(&self) -> f32 {
        self.base_lr * self.factor(self.current_step)
    }

    fn step(&mut self) {
        self.current_step += 1;
    }
}
