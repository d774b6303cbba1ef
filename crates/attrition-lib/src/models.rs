//! Core data models for attrition risk scoring

use serde::{Deserialize, Serialize};
use std::fmt;

/// Two-valued attrition risk label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLabel {
    LowRisk,
    HighRisk,
}

impl RiskLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLabel::LowRisk => "low_risk",
            RiskLabel::HighRisk => "high_risk",
        }
    }

    pub fn is_high(&self) -> bool {
        matches!(self, RiskLabel::HighRisk)
    }
}

impl fmt::Display for RiskLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskLabel::LowRisk => write!(f, "Low risk of attrition"),
            RiskLabel::HighRisk => write!(f, "High risk of attrition"),
        }
    }
}

/// A class label exactly as emitted by a trained artifact.
///
/// Artifacts trained on different encodings of the target emit integers,
/// floats, booleans or strings. [`RawLabel::risk`] collapses all of them
/// into a [`RiskLabel`] right after prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawLabel {
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(String),
}

impl RawLabel {
    /// `1`, `true` and the case-insensitive strings "yes"/"true"/"1" mean attrition
    pub fn risk(&self) -> RiskLabel {
        let high = match self {
            RawLabel::Int(v) => *v == 1,
            RawLabel::Float(v) => *v == 1.0,
            RawLabel::Bool(v) => *v,
            RawLabel::Text(s) => {
                let s = s.trim().to_ascii_lowercase();
                matches!(s.as_str(), "yes" | "true" | "1")
            }
        };
        if high {
            RiskLabel::HighRisk
        } else {
            RiskLabel::LowRisk
        }
    }
}

impl fmt::Display for RawLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawLabel::Int(v) => write!(f, "{}", v),
            RawLabel::Float(v) => write!(f, "{}", v),
            RawLabel::Bool(v) => write!(f, "{}", v),
            RawLabel::Text(s) => write!(f, "{}", s),
        }
    }
}

/// Risk decision returned to the presentation layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub label: RiskLabel,
    /// Probability mass of the attrition class, when the artifact estimates one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub probability: Option<f64>,
}
