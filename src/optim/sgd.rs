//! Stochastic Gradient Descent optimizer

use ndarray::{ArrayD, Zip};

use super::Optimizer;
use crate::parameter::Parameter;

/// SGD optimizer with optional momentum and L2 weight decay
pub struct SGD {
    lr: f32,
    momentum: f32,
    weight_decay: f32,
    velocities: Vec<Option<ArrayD<f32>>>,
}

impl SGD {
    /// Create a new SGD optimizer
    pub fn new(lr: f32, momentum: f32, weight_decay: f32) -> Self {
        Self {
            lr,
            momentum,
            weight_decay,
            velocities: Vec::new(),
        }
    }
}

impl Optimizer for SGD {
    fn step(&mut self, params: &mut [&mut Parameter]) {
        if self.velocities.len() < params.len() {
            self.velocities.resize(params.len(), None);
        }
        let (lr, momentum, wd) = (self.lr, self.momentum, self.weight_decay);

        for (i, param) in params.iter_mut().enumerate() {
            let Some(mut grad) = param.grad().cloned() else {
                continue;
            };
            if wd != 0.0 {
                grad.scaled_add(wd, param.value());
            }

            if momentum > 0.0 {
                let velocity =
                    self.velocities[i].get_or_insert_with(|| ArrayD::zeros(grad.raw_dim()));
                Zip::from(&mut *velocity)
                    .and(&grad)
                    .for_each(|v, &g| *v = momentum * *v + g);
                param.value_mut().scaled_add(-lr, &*velocity);
            } else {
                param.value_mut().scaled_add(-lr, &grad);
            }
        }
    }

    fn lr(&self) -> f32 {
        self.lr
    }

    fn set_lr(&mut self, lr: f32) {
        self.lr = lr;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::arr1;

    #[test]
    fn test_plain_step() {
        let mut opt = SGD::new(0.1, 0.0, 0.0);
        let mut p = Parameter::new("p", arr1(&[1.0, 2.0]).into_dyn(), true);
        p.accumulate_grad(&arr1(&[1.0, -1.0]).into_dyn()).unwrap();
        opt.step(&mut [&mut p]);
        assert_abs_diff_eq!(p.value()[[0]], 0.9, epsilon = 1e-6);
        assert_abs_diff_eq!(p.value()[[1]], 2.1, epsilon = 1e-6);
    }

    #[test]
    fn test_momentum_accumulates() {
        let mut opt = SGD::new(0.1, 0.9, 0.0);
        let mut p = Parameter::new("p", arr1(&[0.0]).into_dyn(), true);
        p.accumulate_grad(&arr1(&[1.0]).into_dyn()).unwrap();
        opt.step(&mut [&mut p]);
        opt.step(&mut [&mut p]);
        // v1 = 1, v2 = 1.9 -> p = -(0.1 + 0.19)
        assert_abs_diff_eq!(p.value()[[0]], -0.29, epsilon = 1e-6);
    }
}
