//! Gradient clipping utilities

use crate::parameter::Parameter;

/// Clip gradients by global norm
///
/// Computes the global norm of all gradients and scales them down if the norm
/// exceeds max_norm. A `max_norm` of zero disables clipping.
///
/// # Returns
/// The global norm before clipping
pub fn clip_grad_norm(params: &mut [&mut Parameter], max_norm: f32) -> f32 {
    let total_norm_sq: f32 = params
        .iter()
        .filter_map(|p| p.grad())
        .map(|g| g.iter().map(|&x| x * x).sum::<f32>())
        .sum();
    let global_norm = total_norm_sq.sqrt();

    if max_norm > 0.0 && global_norm > max_norm {
        let clip_coef = max_norm / (global_norm + 1e-6);
        for param in params.iter_mut() {
            if let Some(grad) = param.grad_mut() {
                grad.mapv_inplace(|g| g * clip_coef);
            }
        }
    }

    global_norm
}
