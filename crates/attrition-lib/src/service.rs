//! Boundary facade used by the presentation hosts
//!
//! Combines the resolver cache with the inference adapter and turns an
//! absent or unloadable artifact into [`AssessError::ModelUnavailable`]
//! instead of a panic.

use crate::artifact::{ArtifactMetadata, ModelArtifact, ModelResolver, ResolutionResult};
use crate::models::Decision;
use crate::observability::{ServiceMetrics, StructuredLogger};
use crate::predictor::{InferenceAdapter, InferenceError, ModelError, RawFields, SchemaError};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;
use thiserror::Error;

/// Request-level failure surfaced to the presentation layer
#[derive(Debug, Clone, Error)]
pub enum AssessError {
    #[error("model unavailable: {0}")]
    ModelUnavailable(String),

    #[error("invalid input: {0}")]
    Schema(SchemaError),

    #[error("prediction failed: {0}")]
    Prediction(ModelError),
}

impl AssessError {
    /// Stable error kind for metrics and API bodies
    pub fn kind(&self) -> &'static str {
        match self {
            AssessError::ModelUnavailable(_) => "model_unavailable",
            AssessError::Schema(_) => "schema",
            AssessError::Prediction(_) => "prediction",
        }
    }
}

impl From<InferenceError> for AssessError {
    fn from(err: InferenceError) -> Self {
        match err {
            InferenceError::Schema(e) => AssessError::Schema(e),
            InferenceError::Prediction(e) => AssessError::Prediction(e),
        }
    }
}

/// Serializable view of the current resolution outcome
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ModelStatus {
    Loaded {
        artifact: ArtifactMetadata,
    },
    NotFound {
        searched: Vec<PathBuf>,
        message: String,
    },
    LoadError {
        path: PathBuf,
        cause: String,
        message: String,
    },
}

impl From<&ResolutionResult> for ModelStatus {
    fn from(result: &ResolutionResult) -> Self {
        match result {
            ResolutionResult::Loaded { artifact, .. } => ModelStatus::Loaded {
                artifact: artifact.metadata().clone(),
            },
            ResolutionResult::NotFound { searched } => ModelStatus::NotFound {
                searched: searched.clone(),
                message: result.message(),
            },
            ResolutionResult::LoadError { path, cause } => ModelStatus::LoadError {
                path: path.clone(),
                cause: cause.to_string(),
                message: result.message(),
            },
        }
    }
}

/// One scoring request together with the resolution it ran against
///
/// Hosts mirror `resolution` into health state, so concurrent requests
/// never report each other's outcome.
#[derive(Debug)]
pub struct Assessment {
    pub resolution: ResolutionResult,
    pub outcome: Result<Decision, AssessError>,
}

/// Attrition scoring service
pub struct AttritionService {
    resolver: ModelResolver,
    metrics: ServiceMetrics,
    logger: StructuredLogger,
}

impl AttritionService {
    pub fn new(resolver: ModelResolver, instance: impl Into<String>) -> Self {
        Self {
            resolver,
            metrics: ServiceMetrics::new(),
            logger: StructuredLogger::new(instance),
        }
    }

    pub fn resolver(&self) -> &ModelResolver {
        &self.resolver
    }

    pub fn logger(&self) -> &StructuredLogger {
        &self.logger
    }

    /// Cached resolution, resolving on first use
    pub fn resolution(&self) -> ResolutionResult {
        if let Some(artifact) = self.resolver.cached() {
            return ResolutionResult::Loaded {
                path: artifact.path().to_path_buf(),
                artifact,
            };
        }
        let start = Instant::now();
        let result = self.resolver.artifact();
        self.metrics
            .observe_resolution_latency(start.elapsed().as_secs_f64());
        self.record_resolution(&result);
        result
    }

    pub fn status(&self) -> ModelStatus {
        ModelStatus::from(&self.resolution())
    }

    /// Drop the cached artifact and resolve again
    pub fn reload(&self) -> ResolutionResult {
        let start = Instant::now();
        let result = self.resolver.reload();
        self.metrics
            .observe_resolution_latency(start.elapsed().as_secs_f64());
        self.record_resolution(&result);
        result
    }

    /// Validate raw fields and score them with the resolved model
    pub fn assess(&self, raw: &RawFields) -> Result<Decision, AssessError> {
        self.evaluate(raw).outcome
    }

    /// Like [`assess`](Self::assess), also returning the resolution used
    pub fn evaluate(&self, raw: &RawFields) -> Assessment {
        let resolution = self.resolution();
        let outcome = match resolution.artifact() {
            Some(artifact) => self.score(artifact, raw),
            None => {
                let err = AssessError::ModelUnavailable(resolution.message());
                self.reject(&err, "resolving");
                Err(err)
            }
        };
        Assessment {
            resolution,
            outcome,
        }
    }

    fn score(&self, artifact: &ModelArtifact, raw: &RawFields) -> Result<Decision, AssessError> {
        let start = Instant::now();
        let mut adapter = InferenceAdapter::new(artifact.classifier());
        let result = adapter.assess(raw);
        let elapsed = start.elapsed();
        self.metrics.observe_prediction_latency(elapsed.as_secs_f64());

        match result {
            Ok(decision) => {
                self.metrics.inc_decision(&decision);
                self.logger
                    .log_decision(&decision, &artifact.metadata().kind, elapsed.as_micros());
                Ok(decision)
            }
            Err(e) => {
                let stage = e.stage().to_string();
                let err = AssessError::from(e);
                self.reject(&err, &stage);
                Err(err)
            }
        }
    }

    fn reject(&self, err: &AssessError, stage: &str) {
        self.metrics.inc_error(err.kind());
        self.logger.log_rejection(err.kind(), stage, &err.to_string());
    }

    fn record_resolution(&self, result: &ResolutionResult) {
        match result {
            ResolutionResult::Loaded { artifact, .. } => {
                self.metrics.set_model(Some(artifact.metadata()));
                self.logger.log_model_resolved(artifact.metadata());
            }
            ResolutionResult::NotFound { searched } => {
                self.metrics.set_model(None);
                self.logger.log_model_not_found(searched);
            }
            ResolutionResult::LoadError { path, cause } => {
                self.metrics.set_model(None);
                self.logger.log_model_load_failed(path, &cause.to_string());
            }
        }
    }
}
