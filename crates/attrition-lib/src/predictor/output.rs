//! Post-processing of raw classifier outputs
//!
//! Locates the attrition class among an artifact's class labels and pulls
//! its probability out of a predicted distribution.

use crate::models::{RawLabel, RiskLabel};
use thiserror::Error;

/// Tolerance when checking that a distribution stays within [0, 1]
const PROBABILITY_EPSILON: f64 = 1e-9;

/// Reasons a probability could not be attached to a decision
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProbabilityError {
    #[error("distribution has {got} columns but the model declares {expected} classes")]
    WidthMismatch { expected: usize, got: usize },

    #[error("no class label maps to the attrition class")]
    NoPositiveClass,

    #[error("class labels {0} and {1} both map to the attrition class")]
    AmbiguousPositiveClass(usize, usize),

    #[error("probability {0} is outside [0, 1]")]
    OutOfRange(f64),
}

/// Index of the attrition class, found by label rather than by position
pub fn positive_class_index(classes: &[RawLabel]) -> Result<usize, ProbabilityError> {
    let mut found = None;
    for (idx, class) in classes.iter().enumerate() {
        if class.risk() == RiskLabel::HighRisk {
            if let Some(first) = found {
                return Err(ProbabilityError::AmbiguousPositiveClass(first, idx));
            }
            found = Some(idx);
        }
    }
    found.ok_or(ProbabilityError::NoPositiveClass)
}

/// Probability mass assigned to the attrition class
pub fn positive_class_probability(
    classes: &[RawLabel],
    distribution: &[f64],
) -> Result<f64, ProbabilityError> {
    if distribution.len() != classes.len() {
        return Err(ProbabilityError::WidthMismatch {
            expected: classes.len(),
            got: distribution.len(),
        });
    }

    let idx = positive_class_index(classes)?;
    let p = distribution[idx];
    if !p.is_finite() || p < -PROBABILITY_EPSILON || p > 1.0 + PROBABILITY_EPSILON {
        return Err(ProbabilityError::OutOfRange(p));
    }
    Ok(p.clamp(0.0, 1.0))
}
