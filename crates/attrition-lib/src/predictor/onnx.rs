//! ONNX classifier inference using tract
//!
//! Runs classifier graphs exported from scikit-learn (for example a random
//! forest converted with `zipmap=False`). Output 0 carries the predicted
//! label; an optional output 1 carries the `[1, n_classes]` probability
//! matrix whose column order is given by the configured class labels.

use super::features::{FeatureRecord, FEATURE_COUNT};
use super::{Classifier, ModelError, ProbabilityEstimator};
use crate::models::RawLabel;
use anyhow::Context;
use std::time::Instant;
use tract_onnx::prelude::*;
use tracing::{debug, warn};

/// Maximum inference latency before warning
const MAX_INFERENCE_MS: u128 = 50;

type TractModel = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// ONNX-based classifier backed by an optimized tract plan
pub struct OnnxClassifier {
    model: TractModel,
    classes: Vec<RawLabel>,
    has_probabilities: bool,
}

impl OnnxClassifier {
    /// Parse and optimize an ONNX graph from bytes
    pub fn from_bytes(model_bytes: &[u8], classes: Vec<RawLabel>) -> TractResult<Self> {
        let model = tract_onnx::onnx()
            .model_for_read(&mut std::io::Cursor::new(model_bytes))
            .context("Failed to parse ONNX model")?
            .with_input_fact(0, f32::fact([1, FEATURE_COUNT]).into())
            .context("Failed to set input shape")?
            .into_optimized()
            .context("Failed to optimize model")?
            .into_runnable()
            .context("Failed to create runnable model")?;

        let outputs = model.model().outputs.len();
        if outputs == 0 {
            anyhow::bail!("ONNX model declares no outputs");
        }

        Ok(Self {
            model,
            classes,
            has_probabilities: outputs > 1,
        })
    }

    fn run(&self, record: &FeatureRecord) -> Result<TVec<TValue>, ModelError> {
        let start = Instant::now();
        let input: Tensor =
            tract_ndarray::Array2::from_shape_vec((1, FEATURE_COUNT), record.to_f32().to_vec())
                .map_err(|e| ModelError::Inference(e.to_string()))?
                .into();

        let outputs = self
            .model
            .run(tvec!(input.into()))
            .map_err(|e| ModelError::Inference(format!("{:#}", e)))?;

        let elapsed = start.elapsed();
        if elapsed.as_millis() > MAX_INFERENCE_MS {
            warn!(elapsed_ms = elapsed.as_millis(), "Inference exceeded {}ms target", MAX_INFERENCE_MS);
        } else {
            debug!(elapsed_us = elapsed.as_micros(), "Inference completed");
        }
        Ok(outputs)
    }
}

/// First element of a label tensor, keeping integer and string encodings apart
fn first_label(tensor: &Tensor) -> Result<RawLabel, ModelError> {
    if tensor.datum_type() == DatumType::String {
        let view = tensor
            .to_array_view::<String>()
            .map_err(|e| ModelError::InvalidOutput(e.to_string()))?;
        return view
            .iter()
            .next()
            .cloned()
            .map(RawLabel::Text)
            .ok_or(ModelError::EmptyOutput);
    }

    if tensor.datum_type() == DatumType::Bool {
        let view = tensor
            .to_array_view::<bool>()
            .map_err(|e| ModelError::InvalidOutput(e.to_string()))?;
        return view.iter().next().copied().map(RawLabel::Bool).ok_or(ModelError::EmptyOutput);
    }

    let is_float = tensor.datum_type().is_float();
    let cast = tensor
        .cast_to::<f64>()
        .map_err(|e| ModelError::InvalidOutput(e.to_string()))?;
    let value = cast
        .to_array_view::<f64>()
        .map_err(|e| ModelError::InvalidOutput(e.to_string()))?
        .iter()
        .next()
        .copied()
        .ok_or(ModelError::EmptyOutput)?;

    if is_float {
        Ok(RawLabel::Float(value))
    } else {
        Ok(RawLabel::Int(value as i64))
    }
}

/// Probability row of a `[1, n_classes]` output tensor
fn probability_row(tensor: &Tensor) -> Result<Vec<f64>, ModelError> {
    let cast = tensor
        .cast_to::<f32>()
        .map_err(|e| ModelError::InvalidOutput(e.to_string()))?;
    let view = cast
        .to_array_view::<f32>()
        .map_err(|e| ModelError::InvalidOutput(e.to_string()))?;
    if view.ndim() == 2 && view.shape()[0] != 1 {
        return Err(ModelError::InvalidOutput(format!(
            "expected one probability row, got shape {:?}",
            view.shape()
        )));
    }
    let row: Vec<f64> = view.iter().map(|p| *p as f64).collect();
    if row.is_empty() {
        return Err(ModelError::EmptyOutput);
    }
    Ok(row)
}

impl Classifier for OnnxClassifier {
    fn predict(&self, record: &FeatureRecord) -> Result<RawLabel, ModelError> {
        let outputs = self.run(record)?;
        let label = outputs.first().ok_or(ModelError::EmptyOutput)?;
        first_label(label)
    }

    fn probabilities(&self) -> Option<&dyn ProbabilityEstimator> {
        if self.has_probabilities {
            Some(self)
        } else {
            None
        }
    }

    fn kind(&self) -> &str {
        "onnx"
    }
}

impl ProbabilityEstimator for OnnxClassifier {
    fn classes(&self) -> &[RawLabel] {
        &self.classes
    }

    fn predict_proba(&self, record: &FeatureRecord) -> Result<Vec<f64>, ModelError> {
        let outputs = self.run(record)?;
        let proba = outputs.get(1).ok_or(ModelError::EmptyOutput)?;
        probability_row(proba)
    }
}
