//! Quantization of frozen base weights for adapter training

mod int8;

pub use int8::{prepare_for_int8_training, Int8Summary, Int8Weight, INT8_MAX};
