//! Hyperparameter values of a grid point

use crate::error::{Result, SweepError};
use crate::training::{Gamma, MaxDepth, MaxFeatures};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One hyperparameter value.
///
/// Options that mix a named choice with numbers (`auto` kernel width,
/// unbounded depth, `auto` feature count) are tagged variants rather than
/// sentinels inside a numeric domain.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ParamValue {
    Float(f64),
    Int(i64),
    Bool(bool),
    Gamma(Gamma),
    MaxDepth(MaxDepth),
    MaxFeatures(MaxFeatures),
}

impl ParamValue {
    /// Numeric value, widening integers
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ParamValue::Float(v) => Some(*v),
            ParamValue::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    /// Integer value; negative integers are reported by the caller's validation
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ParamValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ParamValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_gamma(&self) -> Option<Gamma> {
        match self {
            ParamValue::Gamma(g) => Some(*g),
            ParamValue::Float(v) => Some(Gamma::Value(*v)),
            _ => None,
        }
    }

    pub fn as_max_depth(&self) -> Option<MaxDepth> {
        match self {
            ParamValue::MaxDepth(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_max_features(&self) -> Option<MaxFeatures> {
        match self {
            ParamValue::MaxFeatures(m) => Some(*m),
            _ => None,
        }
    }
}

/// Floats keep a trailing `.0` when integral and otherwise print the shortest
/// representation that round-trips; booleans print as `True` / `False`.
impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Float(v) => write!(f, "{:?}", v),
            ParamValue::Int(v) => write!(f, "{}", v),
            ParamValue::Bool(true) => f.write_str("True"),
            ParamValue::Bool(false) => f.write_str("False"),
            ParamValue::Gamma(g) => write!(f, "{}", g),
            ParamValue::MaxDepth(d) => write!(f, "{}", d),
            ParamValue::MaxFeatures(m) => write!(f, "{}", m),
        }
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Float(v)
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        ParamValue::Int(v)
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        ParamValue::Bool(v)
    }
}

impl From<Gamma> for ParamValue {
    fn from(v: Gamma) -> Self {
        ParamValue::Gamma(v)
    }
}

impl From<MaxDepth> for ParamValue {
    fn from(v: MaxDepth) -> Self {
        ParamValue::MaxDepth(v)
    }
}

impl From<MaxFeatures> for ParamValue {
    fn from(v: MaxFeatures) -> Self {
        ParamValue::MaxFeatures(v)
    }
}

/// Named parameter values of one grid point, in dimension order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParamSet {
    values: Vec<(String, ParamValue)>,
}

impl ParamSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: impl Into<String>, value: ParamValue) {
        self.values.push((name.into(), value));
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.values.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.values.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn require(&self, name: &str) -> Result<&ParamValue> {
        self.get(name)
            .ok_or_else(|| SweepError::ConfigError(format!("missing parameter `{}`", name)))
    }

    fn mistyped(name: &str, value: &ParamValue, expected: &str) -> SweepError {
        SweepError::ConfigError(format!(
            "parameter `{}` = {} is not {}",
            name, value, expected
        ))
    }

    pub fn float(&self, name: &str) -> Result<f64> {
        let v = self.require(name)?;
        v.as_f64().ok_or_else(|| Self::mistyped(name, v, "a number"))
    }

    /// Non-negative integer parameter
    pub fn count(&self, name: &str) -> Result<usize> {
        let v = self.require(name)?;
        match v.as_i64() {
            Some(n) if n >= 0 => Ok(n as usize),
            Some(n) => Err(SweepError::ConfigError(format!(
                "parameter `{}` must be non-negative, got {}",
                name, n
            ))),
            None => Err(Self::mistyped(name, v, "an integer")),
        }
    }

    pub fn flag(&self, name: &str) -> Result<bool> {
        let v = self.require(name)?;
        v.as_bool().ok_or_else(|| Self::mistyped(name, v, "a boolean"))
    }

    pub fn gamma(&self, name: &str) -> Result<Gamma> {
        let v = self.require(name)?;
        v.as_gamma().ok_or_else(|| Self::mistyped(name, v, "a kernel width"))
    }

    pub fn max_depth(&self, name: &str) -> Result<MaxDepth> {
        let v = self.require(name)?;
        v.as_max_depth().ok_or_else(|| Self::mistyped(name, v, "a depth"))
    }

    pub fn max_features(&self, name: &str) -> Result<MaxFeatures> {
        let v = self.require(name)?;
        v.as_max_features()
            .ok_or_else(|| Self::mistyped(name, v, "a feature count"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_matches_key_format() {
        assert_eq!(ParamValue::Float(1.0).to_string(), "1.0");
        assert_eq!(ParamValue::Float(0.1).to_string(), "0.1");
        assert_eq!(ParamValue::Float(128.0).to_string(), "128.0");
        assert_eq!(ParamValue::Float(2f64.powi(-8)).to_string(), "0.00390625");
        assert_eq!(ParamValue::Float(0.001).to_string(), "0.001");
        assert_eq!(ParamValue::Int(100).to_string(), "100");
        assert_eq!(ParamValue::Bool(true).to_string(), "True");
        assert_eq!(ParamValue::Bool(false).to_string(), "False");
        assert_eq!(ParamValue::Gamma(Gamma::Auto).to_string(), "auto");
        assert_eq!(ParamValue::MaxDepth(MaxDepth::Unbounded).to_string(), "None");
        assert_eq!(ParamValue::MaxFeatures(MaxFeatures::Fixed(5)).to_string(), "5");
    }

    #[test]
    fn test_param_set_accessors() {
        let mut params = ParamSet::new();
        params.push("k", ParamValue::Int(4));
        params.push("l", ParamValue::Int(10));
        params.push("w", ParamValue::Bool(true));
        assert_eq!(params.count("k").unwrap(), 4);
        assert_eq!(params.float("l").unwrap(), 10.0);
        assert!(params.flag("w").unwrap());
        assert!(matches!(params.flag("k"), Err(SweepError::ConfigError(_))));
        assert!(matches!(params.float("missing"), Err(SweepError::ConfigError(_))));
    }

    #[test]
    fn test_negative_count_rejected() {
        let mut params = ParamSet::new();
        params.push("k", ParamValue::Int(-2));
        assert!(matches!(params.count("k"), Err(SweepError::ConfigError(_))));
    }
}
