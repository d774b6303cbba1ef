//! Server configuration

use anyhow::{Context, Result};
use attrition_lib::{
    artifact::{ArtifactOptions, DEFAULT_MAX_ARTIFACT_BYTES},
    ModelResolver, RawLabel, DEFAULT_CANDIDATES,
};
use serde::Deserialize;
use std::path::PathBuf;

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    /// Instance name attached to structured log events
    #[serde(default = "default_instance")]
    pub instance: String,

    /// HTTP port for the prediction API and health/metrics
    #[serde(default = "default_port")]
    pub port: u16,

    /// Ordered artifact candidate paths
    #[serde(default = "default_model_paths")]
    pub model_paths: Vec<String>,

    #[serde(default = "default_max_artifact_bytes")]
    pub max_artifact_bytes: u64,

    /// Probability column labels for ONNX artifacts
    #[serde(default = "default_class_labels")]
    pub class_labels: Vec<String>,
}

fn default_instance() -> String {
    std::env::var("HOSTNAME").unwrap_or_else(|_| "attrition-server".to_string())
}

fn default_port() -> u16 {
    8080
}

fn default_model_paths() -> Vec<String> {
    DEFAULT_CANDIDATES.iter().map(|p| p.to_string()).collect()
}

fn default_max_artifact_bytes() -> u64 {
    DEFAULT_MAX_ARTIFACT_BYTES
}

fn default_class_labels() -> Vec<String> {
    vec!["0".to_string(), "1".to_string()]
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            instance: default_instance(),
            port: default_port(),
            model_paths: default_model_paths(),
            max_artifact_bytes: default_max_artifact_bytes(),
            class_labels: default_class_labels(),
        }
    }
}

impl ServiceConfig {
    /// Load configuration from an optional `attrition.toml` and `ATTRITION_*` variables
    pub fn load() -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("attrition").required(false))
            .add_source(
                config::Environment::with_prefix("ATTRITION")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("model_paths")
                    .with_list_parse_key("class_labels"),
            )
            .build()
            .context("Failed to read configuration")?;

        config
            .try_deserialize()
            .context("Invalid ATTRITION_* configuration")
    }

    pub fn artifact_options(&self) -> ArtifactOptions {
        ArtifactOptions {
            max_artifact_bytes: self.max_artifact_bytes,
            onnx_class_labels: self.class_labels.iter().map(|l| parse_label(l)).collect(),
        }
    }

    pub fn resolver(&self) -> Result<ModelResolver> {
        let candidates = self.model_paths.iter().map(PathBuf::from).collect();
        ModelResolver::with_options(candidates, self.artifact_options())
            .context("No model candidate paths configured")
    }
}

/// Interpret a configured class label the way a JSON document would
pub fn parse_label(raw: &str) -> RawLabel {
    let raw = raw.trim();
    if let Ok(i) = raw.parse::<i64>() {
        RawLabel::Int(i)
    } else if let Ok(f) = raw.parse::<f64>() {
        RawLabel::Float(f)
    } else if let Ok(b) = raw.parse::<bool>() {
        RawLabel::Bool(b)
    } else {
        RawLabel::Text(raw.to_string())
    }
}
