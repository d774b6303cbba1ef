//! Health tracking for the attrition scoring service
//!
//! Backs the liveness and readiness endpoints. The `model` component
//! follows the last resolution outcome; `inference` follows the last
//! prediction.

use crate::artifact::ResolutionResult;
use crate::models::Decision;
use crate::service::AssessError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Tracked parts of the service
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Component {
    Model,
    Inference,
}

impl Component {
    pub const ALL: [Component; 2] = [Component::Model, Component::Inference];

    pub fn as_str(&self) -> &'static str {
        match self {
            Component::Model => "model",
            Component::Inference => "inference",
        }
    }
}

/// Health status of a component, ordered from best to worst
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentStatus {
    Healthy,
    /// Still serving, but something needs attention
    Degraded,
    Unhealthy,
}

impl ComponentStatus {
    pub fn is_operational(&self) -> bool {
        *self != ComponentStatus::Unhealthy
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    pub status: ComponentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Unix seconds of the last update
    pub checked_at: i64,
}

impl ComponentHealth {
    fn at_now(status: ComponentStatus, message: Option<String>) -> Self {
        Self {
            status,
            message,
            checked_at: chrono::Utc::now().timestamp(),
        }
    }

    pub fn healthy() -> Self {
        Self::at_now(ComponentStatus::Healthy, None)
    }

    pub fn degraded(message: impl Into<String>) -> Self {
        Self::at_now(ComponentStatus::Degraded, Some(message.into()))
    }

    pub fn unhealthy(message: impl Into<String>) -> Self {
        Self::at_now(ComponentStatus::Unhealthy, Some(message.into()))
    }

    /// Missing artifact degrades the service; a corrupt one is a failure
    pub fn from_resolution(result: &ResolutionResult) -> Self {
        match result {
            ResolutionResult::Loaded { .. } => Self::healthy(),
            ResolutionResult::NotFound { .. } => Self::degraded(result.message()),
            ResolutionResult::LoadError { .. } => Self::unhealthy(result.message()),
        }
    }

    /// Inference health after one request
    ///
    /// Rejected input says nothing about the model, so only successes and
    /// prediction failures produce an update.
    pub fn from_assessment(outcome: &Result<Decision, AssessError>) -> Option<Self> {
        match outcome {
            Ok(_) => Some(Self::healthy()),
            Err(AssessError::Prediction(cause)) => Some(Self::degraded(cause.to_string())),
            Err(_) => None,
        }
    }
}

/// Body of the liveness endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: ComponentStatus,
    pub components: BTreeMap<Component, ComponentHealth>,
}

impl HealthResponse {
    /// Worst status across components
    pub fn compute_status(components: &BTreeMap<Component, ComponentHealth>) -> ComponentStatus {
        components
            .values()
            .map(|h| h.status)
            .max()
            .unwrap_or(ComponentStatus::Healthy)
    }
}

/// Body of the readiness endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessResponse {
    pub ready: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug)]
struct RegistryState {
    components: BTreeMap<Component, ComponentHealth>,
    ready: bool,
}

/// Shared, cloneable view of component health
#[derive(Debug, Clone)]
pub struct HealthRegistry {
    state: Arc<RwLock<RegistryState>>,
}

impl Default for HealthRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl HealthRegistry {
    /// Both components tracked from the start; the model is degraded until resolved
    pub fn new() -> Self {
        let mut components = BTreeMap::new();
        components.insert(Component::Model, ComponentHealth::degraded("model not resolved yet"));
        components.insert(Component::Inference, ComponentHealth::healthy());
        Self {
            state: Arc::new(RwLock::new(RegistryState {
                components,
                ready: false,
            })),
        }
    }

    pub async fn update(&self, component: Component, health: ComponentHealth) {
        self.state.write().await.components.insert(component, health);
    }

    pub async fn record_resolution(&self, result: &ResolutionResult) {
        self.update(Component::Model, ComponentHealth::from_resolution(result))
            .await;
    }

    pub async fn record_assessment(&self, outcome: &Result<Decision, AssessError>) {
        if let Some(health) = ComponentHealth::from_assessment(outcome) {
            self.update(Component::Inference, health).await;
        }
    }

    pub async fn set_ready(&self, ready: bool) {
        self.state.write().await.ready = ready;
    }

    pub async fn component(&self, component: Component) -> Option<ComponentHealth> {
        self.state.read().await.components.get(&component).cloned()
    }

    pub async fn health(&self) -> HealthResponse {
        let components = self.state.read().await.components.clone();
        HealthResponse {
            status: HealthResponse::compute_status(&components),
            components,
        }
    }

    /// Ready once started, unless a component is unhealthy
    pub async fn readiness(&self) -> ReadinessResponse {
        let state = self.state.read().await;

        if !state.ready {
            return ReadinessResponse {
                ready: false,
                reason: Some("Service not yet initialized".to_string()),
            };
        }

        let failing: Vec<&str> = state
            .components
            .iter()
            .filter(|(_, h)| !h.status.is_operational())
            .map(|(c, _)| c.as_str())
            .collect();

        if failing.is_empty() {
            ReadinessResponse {
                ready: true,
                reason: None,
            }
        } else {
            ReadinessResponse {
                ready: false,
                reason: Some(format!("Unhealthy components: {}", failing.join(", "))),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::LoadError;
    use crate::models::RiskLabel;
    use crate::predictor::ModelError;
    use std::path::PathBuf;

    #[tokio::test]
    async fn test_initial_state_tracks_both_components() {
        let registry = HealthRegistry::new();
        let health = registry.health().await;

        assert_eq!(health.components.len(), Component::ALL.len());
        assert_eq!(health.components[&Component::Model].status, ComponentStatus::Degraded);
        assert_eq!(health.components[&Component::Inference].status, ComponentStatus::Healthy);
        assert_eq!(health.status, ComponentStatus::Degraded);
    }

    #[tokio::test]
    async fn test_missing_model_degrades() {
        let registry = HealthRegistry::new();
        registry
            .record_resolution(&ResolutionResult::NotFound {
                searched: vec![PathBuf::from("model/rf_model.onnx")],
            })
            .await;

        let model = registry.component(Component::Model).await.unwrap();
        assert_eq!(model.status, ComponentStatus::Degraded);
        assert!(model.message.unwrap().contains("model/rf_model.onnx"));
    }

    #[tokio::test]
    async fn test_corrupt_model_unhealthy_and_not_ready() {
        let registry = HealthRegistry::new();
        registry.set_ready(true).await;
        registry
            .record_resolution(&ResolutionResult::LoadError {
                path: PathBuf::from("rf_model.json"),
                cause: LoadError::Decode("expected value".to_string()),
            })
            .await;

        assert_eq!(registry.health().await.status, ComponentStatus::Unhealthy);
        let readiness = registry.readiness().await;
        assert!(!readiness.ready);
        assert!(readiness.reason.unwrap().contains("model"));
    }

    #[tokio::test]
    async fn test_readiness_not_ready_initially() {
        let readiness = HealthRegistry::new().readiness().await;

        assert!(!readiness.ready);
        assert!(readiness.reason.is_some());
    }

    #[tokio::test]
    async fn test_degraded_is_still_ready() {
        let registry = HealthRegistry::new();
        registry.set_ready(true).await;

        assert!(registry.readiness().await.ready);
        assert!(registry.health().await.status.is_operational());
    }

    #[tokio::test]
    async fn test_assessment_updates_inference() {
        let registry = HealthRegistry::new();

        let failed: Result<Decision, AssessError> =
            Err(AssessError::Prediction(ModelError::EmptyOutput));
        registry.record_assessment(&failed).await;
        let inference = registry.component(Component::Inference).await.unwrap();
        assert_eq!(inference.status, ComponentStatus::Degraded);

        // an unavailable model leaves inference health alone
        let rejected: Result<Decision, AssessError> =
            Err(AssessError::ModelUnavailable("missing".into()));
        registry.record_assessment(&rejected).await;
        let inference = registry.component(Component::Inference).await.unwrap();
        assert_eq!(inference.status, ComponentStatus::Degraded);

        let ok = Ok(Decision {
            label: RiskLabel::LowRisk,
            probability: None,
        });
        registry.record_assessment(&ok).await;
        let inference = registry.component(Component::Inference).await.unwrap();
        assert_eq!(inference.status, ComponentStatus::Healthy);
    }

    #[test]
    fn test_components_serialize_lowercase() {
        let mut components = BTreeMap::new();
        components.insert(Component::Model, ComponentHealth::healthy());
        let json = serde_json::to_value(HealthResponse {
            status: HealthResponse::compute_status(&components),
            components,
        })
        .unwrap();
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["components"]["model"]["status"], "healthy");
    }
}
