//! Typed views over string-valued training options

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::ConfigError;

/// When to evaluate or save during training
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntervalStrategy {
    /// Never
    No,
    /// Every `logging_steps` optimizer steps
    Steps,
    /// At the end of every epoch
    Epoch,
}

impl FromStr for IntervalStrategy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "no" | "none" => Ok(Self::No),
            "steps" => Ok(Self::Steps),
            "epoch" => Ok(Self::Epoch),
            other => Err(ConfigError::invalid(
                "strategy",
                format!("unknown interval strategy '{other}' (expected no, steps or epoch)"),
            )),
        }
    }
}

impl fmt::Display for IntervalStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::No => "no",
            Self::Steps => "steps",
            Self::Epoch => "epoch",
        };
        write!(f, "{s}")
    }
}

/// Learning-rate schedule shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchedulerType {
    Linear,
    Cosine,
    Constant,
    ConstantWithWarmup,
}

impl FromStr for SchedulerType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "linear" => Ok(Self::Linear),
            "cosine" => Ok(Self::Cosine),
            "constant" => Ok(Self::Constant),
            "constant_with_warmup" => Ok(Self::ConstantWithWarmup),
            other => Err(ConfigError::invalid(
                "scheduler",
                format!(
                    "unknown scheduler '{other}' (expected linear, cosine, constant or constant_with_warmup)"
                ),
            )),
        }
    }
}

impl fmt::Display for SchedulerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Linear => "linear",
            Self::Cosine => "cosine",
            Self::Constant => "constant",
            Self::ConstantWithWarmup => "constant_with_warmup",
        };
        write!(f, "{s}")
    }
}

/// Optimizer family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptimizerKind {
    AdamW,
    Sgd,
}

impl FromStr for OptimizerKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "adamw_torch" | "adamw_hf" | "adamw_torch_fused" | "adamw" => Ok(Self::AdamW),
            "sgd" => Ok(Self::Sgd),
            other => Err(ConfigError::invalid(
                "optimizer",
                format!("unsupported optimizer '{other}' (expected adamw_torch, adamw_hf, adamw_torch_fused or sgd)"),
            )),
        }
    }
}

impl fmt::Display for OptimizerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AdamW => write!(f, "adamw"),
            Self::Sgd => write!(f, "sgd"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_strategy_parse() {
        assert_eq!("no".parse::<IntervalStrategy>().unwrap(), IntervalStrategy::No);
        assert_eq!("EPOCH".parse::<IntervalStrategy>().unwrap(), IntervalStrategy::Epoch);
        assert_eq!(" steps ".parse::<IntervalStrategy>().unwrap(), IntervalStrategy::Steps);
        assert!("hourly".parse::<IntervalStrategy>().is_err());
    }

    #[test]
    fn test_optimizer_aliases() {
        for name in ["adamw_torch", "adamw_hf", "adamw_torch_fused"] {
            assert_eq!(name.parse::<OptimizerKind>().unwrap(), OptimizerKind::AdamW);
        }
        assert_eq!("sgd".parse::<OptimizerKind>().unwrap(), OptimizerKind::Sgd);
        assert!("adafactor".parse::<OptimizerKind>().is_err());
    }

    #[test]
    fn test_scheduler_display_matches_parse() {
        for kind in [
            SchedulerType::Linear,
            SchedulerType::Cosine,
            SchedulerType::Constant,
            SchedulerType::ConstantWithWarmup,
        ] {
            assert_eq!(kind.to_string().parse::<SchedulerType>().unwrap(), kind);
        }
    }
}
