//! Classifier capabilities and inference

mod adapter;
mod features;
mod forest;
mod onnx;
mod output;


pub use adapter::{InferenceAdapter, InferenceError, InferenceStage};
pub use features::{
    check_feature_names, default_raw_fields, FeatureRecord, FieldKind, FieldSpec, FieldValue,
    OverTime, RawFields, SchemaError, FEATURE_COUNT, FEATURE_SCHEMA, INPUT_FIELDS, OVERTIME_FIELD,
};
pub use forest::{DecisionTree, LinearModel, ModelDocument, RandomForest, TreeNode};
pub use onnx::OnnxClassifier;
pub use output::{positive_class_index, positive_class_probability, ProbabilityError};

use crate::models::RawLabel;
use thiserror::Error;

/// Failure raised by a classifier while scoring a record
#[derive(Debug, Clone, Error)]
pub enum ModelError {
    #[error("inference failed: {0}")]
    Inference(String),

    #[error("model produced no output")]
    EmptyOutput,

    #[error("unexpected model output: {0}")]
    InvalidOutput(String),
}

/// Trait for trained classifiers
///
/// `predict` is mandatory. Probability estimation is an optional
/// capability discovered through [`Classifier::probabilities`].
pub trait Classifier: Send + Sync {
    /// Predict the class label for a single record
    fn predict(&self, record: &FeatureRecord) -> Result<RawLabel, ModelError>;

    /// Probability estimation capability, if the model supports it
    fn probabilities(&self) -> Option<&dyn ProbabilityEstimator> {
        None
    }

    /// Feature names the model was trained on, if the artifact records them
    fn feature_names(&self) -> Option<&[String]> {
        None
    }

    /// Short model family name, e.g. "random_forest"
    fn kind(&self) -> &str;
}

/// Optional per-class probability estimation
pub trait ProbabilityEstimator: Send + Sync {
    /// Class labels in the column order of [`ProbabilityEstimator::predict_proba`]
    fn classes(&self) -> &[RawLabel];

    /// Probability distribution over [`ProbabilityEstimator::classes`]
    fn predict_proba(&self, record: &FeatureRecord) -> Result<Vec<f64>, ModelError>;
}
