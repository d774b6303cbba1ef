//! Core library for employee attrition risk scoring
//!
//! This crate provides the core functionality for:
//! - Locating and loading a trained classifier artifact
//! - Validating and encoding the ten HR input features
//! - Turning raw model output into a labelled risk decision
//! - Health checks and observability

pub mod artifact;
pub mod health;
pub mod models;
pub mod observability;
pub mod predictor;
pub mod service;

pub use artifact::{
    ArtifactFormat, ArtifactMetadata, ArtifactOptions, LoadError, ModelArtifact, ModelResolver,
    ResolutionResult, DEFAULT_CANDIDATES,
};
pub use health::{
    Component, ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse, ReadinessResponse,
};
pub use models::*;
pub use observability::{ServiceMetrics, StructuredLogger};
pub use predictor::{InferenceAdapter, InferenceError, RawFields, SchemaError, FEATURE_SCHEMA};
pub use service::{AssessError, Assessment, AttritionService, ModelStatus};
