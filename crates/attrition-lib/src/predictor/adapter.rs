//! Inference adapter: raw form fields in, risk decision out
//!
//! Each request moves `Idle -> Validating -> Predicting` and ends in either
//! a [`Decision`] or an [`InferenceError`]. There are no retries; a failed
//! request is terminal and the caller resubmits.

use super::features::{check_feature_names, FeatureRecord, RawFields, SchemaError};
use super::output::positive_class_probability;
use super::{Classifier, ModelError};
use crate::models::Decision;
use serde::Serialize;
use std::fmt;
use thiserror::Error;
use tracing::{debug, warn};

/// Lifecycle stage of a single inference request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InferenceStage {
    Idle,
    Validating,
    Predicting,
    Succeeded,
    Failed,
}

impl fmt::Display for InferenceStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            InferenceStage::Idle => "idle",
            InferenceStage::Validating => "validating",
            InferenceStage::Predicting => "predicting",
            InferenceStage::Succeeded => "succeeded",
            InferenceStage::Failed => "failed",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Error)]
pub enum InferenceError {
    #[error("invalid input: {0}")]
    Schema(#[from] SchemaError),

    #[error("prediction failed: {0}")]
    Prediction(#[from] ModelError),
}

impl InferenceError {
    /// Stage the request was in when it failed
    pub fn stage(&self) -> InferenceStage {
        match self {
            InferenceError::Schema(_) => InferenceStage::Validating,
            InferenceError::Prediction(_) => InferenceStage::Predicting,
        }
    }
}

/// Validates raw fields against the trained schema and scores them
pub struct InferenceAdapter<'a> {
    model: &'a dyn Classifier,
    stage: InferenceStage,
}

impl<'a> InferenceAdapter<'a> {
    pub fn new(model: &'a dyn Classifier) -> Self {
        Self {
            model,
            stage: InferenceStage::Idle,
        }
    }

    pub fn stage(&self) -> InferenceStage {
        self.stage
    }

    /// Run one request to completion
    pub fn assess(&mut self, raw: &RawFields) -> Result<Decision, InferenceError> {
        let result = self.run(raw);
        self.stage = match result {
            Ok(_) => InferenceStage::Succeeded,
            Err(_) => InferenceStage::Failed,
        };
        result
    }

    fn run(&mut self, raw: &RawFields) -> Result<Decision, InferenceError> {
        self.stage = InferenceStage::Validating;
        let record = self.validate(raw)?;

        self.stage = InferenceStage::Predicting;
        self.predict(&record)
    }

    fn validate(&self, raw: &RawFields) -> Result<FeatureRecord, SchemaError> {
        if let Some(declared) = self.model.feature_names() {
            // documents exported without column names carry an empty list
            if !declared.is_empty() {
                check_feature_names(declared)?;
            }
        }
        FeatureRecord::from_raw(raw)
    }

    /// Score an already assembled record
    pub fn predict(&self, record: &FeatureRecord) -> Result<Decision, InferenceError> {
        let raw_label = self.model.predict(record)?;
        let label = raw_label.risk();
        debug!(raw_label = %raw_label, label = label.as_str(), "Model predicted label");

        let probability = self.positive_probability(record);
        Ok(Decision { label, probability })
    }

    fn positive_probability(&self, record: &FeatureRecord) -> Option<f64> {
        let estimator = self.model.probabilities()?;
        let distribution = match estimator.predict_proba(record) {
            Ok(d) => d,
            Err(e) => {
                warn!(error = %e, model = self.model.kind(), "Probability estimation failed");
                return None;
            }
        };

        match positive_class_probability(estimator.classes(), &distribution) {
            Ok(p) => Some(p),
            Err(e) => {
                warn!(error = %e, model = self.model.kind(), "Discarding probability output");
                None
            }
        }
    }
}
