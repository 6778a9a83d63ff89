//! Named trainable tensors
//!
//! A [`Parameter`] is a named n-dimensional `f32` array plus an optional
//! accumulated gradient. Model weights, LoRA matrices and optimizer inputs
//! are all expressed in terms of this one type.

use ndarray::{ArrayD, ArrayView2, ArrayViewMut2, Ix2, IxDyn, ShapeError};

/// A named tensor that may receive gradients
#[derive(Debug, Clone)]
pub struct Parameter {
    name: String,
    value: ArrayD<f32>,
    grad: Option<ArrayD<f32>>,
    requires_grad: bool,
}

impl Parameter {
    /// Create a parameter from an existing array
    pub fn new(name: impl Into<String>, value: ArrayD<f32>, requires_grad: bool) -> Self {
        Self {
            name: name.into(),
            value,
            grad: None,
            requires_grad,
        }
    }

    /// Create a zero-filled parameter with the given shape
    pub fn zeros(name: impl Into<String>, shape: &[usize], requires_grad: bool) -> Self {
        Self::new(name, ArrayD::zeros(IxDyn(shape)), requires_grad)
    }

    /// Create a parameter from flat data in row-major order
    pub fn from_vec(
        name: impl Into<String>,
        shape: &[usize],
        data: Vec<f32>,
        requires_grad: bool,
    ) -> Result<Self, ShapeError> {
        let value = ArrayD::from_shape_vec(IxDyn(shape), data)?;
        Ok(Self::new(name, value, requires_grad))
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn shape(&self) -> &[usize] {
        self.value.shape()
    }

    /// Number of scalar elements
    #[must_use]
    pub fn numel(&self) -> usize {
        self.value.len()
    }

    #[must_use]
    pub fn value(&self) -> &ArrayD<f32> {
        &self.value
    }

    pub fn value_mut(&mut self) -> &mut ArrayD<f32> {
        &mut self.value
    }

    /// Replace the stored value, dropping any accumulated gradient
    pub fn set_value(&mut self, value: ArrayD<f32>) {
        self.value = value;
        self.grad = None;
    }

    /// View the value as a matrix
    pub fn matrix(&self) -> Result<ArrayView2<'_, f32>, ShapeError> {
        self.value.view().into_dimensionality::<Ix2>()
    }

    /// Mutable matrix view of the value
    pub fn matrix_mut(&mut self) -> Result<ArrayViewMut2<'_, f32>, ShapeError> {
        self.value.view_mut().into_dimensionality::<Ix2>()
    }

    #[must_use]
    pub fn requires_grad(&self) -> bool {
        self.requires_grad
    }

    /// Freeze or unfreeze the parameter
    pub fn set_requires_grad(&mut self, requires_grad: bool) {
        self.requires_grad = requires_grad;
        if !requires_grad {
            self.grad = None;
        }
    }

    #[must_use]
    pub fn grad(&self) -> Option<&ArrayD<f32>> {
        self.grad.as_ref()
    }

    pub fn grad_mut(&mut self) -> Option<&mut ArrayD<f32>> {
        self.grad.as_mut()
    }

    /// Add `delta` into the accumulated gradient
    ///
    /// Frozen parameters ignore the call. Shapes must match the value.
    pub fn accumulate_grad(&mut self, delta: &ArrayD<f32>) -> Result<(), ShapeError> {
        if !self.requires_grad {
            return Ok(());
        }
        if delta.shape() != self.value.shape() {
            return Err(ShapeError::from_kind(ndarray::ErrorKind::IncompatibleShape));
        }
        match self.grad.as_mut() {
            Some(grad) => *grad += delta,
            None => self.grad = Some(delta.clone()),
        }
        Ok(())
    }

    /// Drop the accumulated gradient
    pub fn zero_grad(&mut self) {
        self.grad = None;
    }
}
