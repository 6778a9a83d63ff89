//! Optimizer trait

use crate::parameter::Parameter;

/// Trait for optimization algorithms
///
/// Parameters are passed by reference in the same order on every call;
/// per-parameter state is keyed by position.
pub trait Optimizer {
    /// Perform a single optimization step
    fn step(&mut self, params: &mut [&mut Parameter]);

    /// Zero out all gradients
    fn zero_grad(&mut self, params: &mut [&mut Parameter]) {
        for param in params.iter_mut() {
            param.zero_grad();
        }
    }

    /// Get learning rate
    fn lr(&self) -> f32;

    /// Set learning rate
    fn set_lr(&mut self, lr: f32);
}
