//! Observability infrastructure for attrition scoring
//!
//! Provides:
//! - Prometheus metrics (prediction latency, decisions by label, errors by kind, model info)
//! - Structured JSON logging with tracing

use crate::artifact::ArtifactMetadata;
use crate::models::Decision;
use prometheus::{
    register_gauge_vec, register_histogram, register_int_counter_vec, register_int_gauge,
    GaugeVec, Histogram, IntCounterVec, IntGauge,
};
use std::path::PathBuf;
use std::sync::OnceLock;
use tracing::{error, info, warn};

/// Histogram buckets for latency measurements (in seconds)
const LATENCY_BUCKETS: &[f64] = &[
    0.0001, 0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0,
];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<ServiceMetricsInner> = OnceLock::new();

struct ServiceMetricsInner {
    prediction_latency_seconds: Histogram,
    resolution_latency_seconds: Histogram,
    decisions: IntCounterVec,
    errors: IntCounterVec,
    model_loaded: IntGauge,
    model_info: GaugeVec,
}

impl ServiceMetricsInner {
    fn new() -> Self {
        Self {
            prediction_latency_seconds: register_histogram!(
                "attrition_prediction_latency_seconds",
                "Time spent validating input and running model inference",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register prediction_latency_seconds"),

            resolution_latency_seconds: register_histogram!(
                "attrition_model_resolution_latency_seconds",
                "Time spent locating and deserializing the model artifact",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register model_resolution_latency_seconds"),

            decisions: register_int_counter_vec!(
                "attrition_decisions_total",
                "Risk decisions returned, by label",
                &["label"]
            )
            .expect("Failed to register decisions_total"),

            errors: register_int_counter_vec!(
                "attrition_errors_total",
                "Requests rejected, by error kind",
                &["kind"]
            )
            .expect("Failed to register errors_total"),

            model_loaded: register_int_gauge!(
                "attrition_model_loaded",
                "Whether a model artifact is currently loaded (1) or not (0)"
            )
            .expect("Failed to register model_loaded"),

            model_info: register_gauge_vec!(
                "attrition_model_info",
                "Information about the currently loaded model artifact",
                &["kind", "format", "checksum"]
            )
            .expect("Failed to register model_info"),
        }
    }
}

/// Service metrics for Prometheus exposition
///
/// Lightweight handle to the global metrics instance; clones share the
/// same underlying metrics.
#[derive(Clone)]
pub struct ServiceMetrics {
    _private: (),
}

impl Default for ServiceMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl ServiceMetrics {
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(ServiceMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &ServiceMetricsInner {
        GLOBAL_METRICS.get_or_init(ServiceMetricsInner::new)
    }

    pub fn observe_prediction_latency(&self, duration_secs: f64) {
        self.inner().prediction_latency_seconds.observe(duration_secs);
    }

    pub fn observe_resolution_latency(&self, duration_secs: f64) {
        self.inner().resolution_latency_seconds.observe(duration_secs);
    }

    pub fn inc_decision(&self, decision: &Decision) {
        self.inner()
            .decisions
            .with_label_values(&[decision.label.as_str()])
            .inc();
    }

    pub fn inc_error(&self, kind: &str) {
        self.inner().errors.with_label_values(&[kind]).inc();
    }

    /// Record the loaded artifact, or its absence
    pub fn set_model(&self, metadata: Option<&ArtifactMetadata>) {
        let inner = self.inner();
        inner.model_info.reset();
        match metadata {
            Some(meta) => {
                inner.model_loaded.set(1);
                let format = meta.format.to_string();
                inner
                    .model_info
                    .with_label_values(&[meta.kind.as_str(), format.as_str(), meta.checksum.as_str()])
                    .set(1.0);
            }
            None => inner.model_loaded.set(0),
        }
    }
}

/// Structured logger for service events
///
/// Consistent JSON-formatted events for model resolution and decisions.
#[derive(Clone)]
pub struct StructuredLogger {
    instance: String,
}

impl StructuredLogger {
    pub fn new(instance: impl Into<String>) -> Self {
        Self {
            instance: instance.into(),
        }
    }

    pub fn log_startup(&self, version: &str, candidates: &[PathBuf]) {
        let candidates: Vec<String> = candidates.iter().map(|p| p.display().to_string()).collect();
        info!(
            event = "service_started",
            instance = %self.instance,
            version = %version,
            candidates = ?candidates,
            "Attrition service started"
        );
    }

    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "service_shutdown",
            instance = %self.instance,
            reason = %reason,
            "Attrition service shutting down"
        );
    }

    pub fn log_model_resolved(&self, metadata: &ArtifactMetadata) {
        info!(
            event = "model_resolved",
            instance = %self.instance,
            path = %metadata.path.display(),
            format = %metadata.format,
            kind = %metadata.kind,
            size_bytes = metadata.size_bytes,
            checksum = %metadata.checksum,
            supports_probability = metadata.supports_probability,
            "Model artifact ready"
        );
    }

    pub fn log_model_not_found(&self, searched: &[PathBuf]) {
        let searched: Vec<String> = searched.iter().map(|p| p.display().to_string()).collect();
        warn!(
            event = "model_not_found",
            instance = %self.instance,
            searched = ?searched,
            "Model artifact not found at any candidate path"
        );
    }

    pub fn log_model_load_failed(&self, path: &std::path::Path, cause: &str) {
        error!(
            event = "model_load_failed",
            instance = %self.instance,
            path = %path.display(),
            cause = %cause,
            "Model artifact could not be loaded"
        );
    }

    pub fn log_decision(&self, decision: &Decision, model_kind: &str, elapsed_us: u128) {
        info!(
            event = "decision_generated",
            instance = %self.instance,
            label = decision.label.as_str(),
            probability = ?decision.probability,
            model_kind = %model_kind,
            elapsed_us = elapsed_us,
            "Generated attrition risk decision"
        );
    }

    pub fn log_rejection(&self, kind: &str, stage: &str, message: &str) {
        warn!(
            event = "prediction_failed",
            instance = %self.instance,
            kind = %kind,
            stage = %stage,
            message = %message,
            "Attrition request rejected"
        );
    }
}
