//! Lenient scalar deserializers
//!
//! Training configs arrive from YAML files, JSON payloads and command-line
//! style string maps, so a number may show up as `"3"` and a flag as
//! `"true"`. These helpers accept either form and coerce to the field type.

use serde::de::{self, Deserializer};
use serde::Deserialize;

#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl Scalar {
    fn describe(&self) -> String {
        match self {
            Self::Bool(b) => format!("boolean {b}"),
            Self::Int(i) => format!("integer {i}"),
            Self::Float(f) => format!("float {f}"),
            Self::Str(s) => format!("string {s:?}"),
        }
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "y" | "on" => Some(true),
        "false" | "0" | "no" | "n" | "off" => Some(false),
        _ => None,
    }
}

fn to_i64(scalar: &Scalar) -> Option<i64> {
    match scalar {
        Scalar::Int(i) => Some(*i),
        Scalar::Float(f) if f.fract() == 0.0 && f.is_finite() => Some(*f as i64),
        Scalar::Str(s) => {
            let s = s.trim();
            s.parse::<i64>().ok().or_else(|| {
                s.parse::<f64>()
                    .ok()
                    .filter(|f| f.fract() == 0.0 && f.is_finite())
                    .map(|f| f as i64)
            })
        }
        _ => None,
    }
}

/// Deserialize a bool from a boolean, a 0/1 integer, or a truthy string
pub fn bool_<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let scalar = Scalar::deserialize(deserializer)?;
    match &scalar {
        Scalar::Bool(b) => Some(*b),
        Scalar::Int(0) => Some(false),
        Scalar::Int(1) => Some(true),
        Scalar::Str(s) => parse_bool(s),
        _ => None,
    }
    .ok_or_else(|| de::Error::custom(format!("expected a boolean, got {}", scalar.describe())))
}

/// Deserialize a non-negative integer from a number or numeric string
pub fn usize_<'de, D>(deserializer: D) -> Result<usize, D::Error>
where
    D: Deserializer<'de>,
{
    let scalar = Scalar::deserialize(deserializer)?;
    to_i64(&scalar)
        .and_then(|i| usize::try_from(i).ok())
        .ok_or_else(|| {
            de::Error::custom(format!(
                "expected a non-negative integer, got {}",
                scalar.describe()
            ))
        })
}

/// Deserialize a signed integer from a number or numeric string
pub fn i64_<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let scalar = Scalar::deserialize(deserializer)?;
    to_i64(&scalar)
        .ok_or_else(|| de::Error::custom(format!("expected an integer, got {}", scalar.describe())))
}

/// Deserialize a float from a number or numeric string
pub fn f64_<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let scalar = Scalar::deserialize(deserializer)?;
    match &scalar {
        Scalar::Int(i) => Some(*i as f64),
        Scalar::Float(f) => Some(*f),
        Scalar::Str(s) => s.trim().parse::<f64>().ok(),
        Scalar::Bool(_) => None,
    }
    .ok_or_else(|| de::Error::custom(format!("expected a number, got {}", scalar.describe())))
}

/// Deserialize a string, stringifying numbers and booleans
pub fn string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Scalar::deserialize(deserializer)? {
        Scalar::Bool(b) => b.to_string(),
        Scalar::Int(i) => i.to_string(),
        Scalar::Float(f) => f.to_string(),
        Scalar::Str(s) => s,
    })
}

/// Deserialize an optional string; `null` maps to `None`
pub fn opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Scalar>::deserialize(deserializer)? {
        None => None,
        Some(Scalar::Bool(b)) => Some(b.to_string()),
        Some(Scalar::Int(i)) => Some(i.to_string()),
        Some(Scalar::Float(f)) => Some(f.to_string()),
        Some(Scalar::Str(s)) => Some(s),
    })
}
