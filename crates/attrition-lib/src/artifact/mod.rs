//! Model artifact loading and resolution
//!
//! This module provides:
//! - Format detection by file extension (`.onnx`, `.json`)
//! - Size limits and SHA-256 checksums for loaded artifacts
//! - First-match-wins resolution over ordered candidate paths, with a
//!   process-lifetime cache

mod resolver;

pub use resolver::{ModelResolver, ResolutionResult, ResolveError, DEFAULT_CANDIDATES};

use crate::models::RawLabel;
use crate::predictor::{Classifier, ModelDocument, OnnxClassifier};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Default upper bound on artifact size
pub const DEFAULT_MAX_ARTIFACT_BYTES: u64 = 64 * 1024 * 1024;

/// Failure to turn an existing file into a usable classifier
#[derive(Debug, Clone, Error)]
pub enum LoadError {
    #[error("failed to read artifact: {0}")]
    Io(String),

    #[error("unsupported artifact format {0:?} (expected .onnx or .json)")]
    UnsupportedFormat(String),

    #[error("artifact is {size} bytes, exceeding the {max} byte limit")]
    TooLarge { size: u64, max: u64 },

    #[error("failed to decode model document: {0}")]
    Decode(String),

    #[error("invalid model document: {0}")]
    Invalid(String),

    #[error("failed to load ONNX model: {0}")]
    Onnx(String),
}

/// Serialized artifact formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactFormat {
    Onnx,
    Json,
}

impl ArtifactFormat {
    pub fn from_path(path: &Path) -> Result<Self, LoadError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "onnx" => Ok(ArtifactFormat::Onnx),
            "json" => Ok(ArtifactFormat::Json),
            _ => Err(LoadError::UnsupportedFormat(ext)),
        }
    }
}

impl fmt::Display for ArtifactFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactFormat::Onnx => f.write_str("onnx"),
            ArtifactFormat::Json => f.write_str("json"),
        }
    }
}

/// Options applied when decoding artifacts
#[derive(Debug, Clone)]
pub struct ArtifactOptions {
    /// Maximum artifact size in bytes
    pub max_artifact_bytes: u64,
    /// Probability column labels for ONNX graphs, which do not carry them
    pub onnx_class_labels: Vec<RawLabel>,
}

impl Default for ArtifactOptions {
    fn default() -> Self {
        Self {
            max_artifact_bytes: DEFAULT_MAX_ARTIFACT_BYTES,
            onnx_class_labels: vec![RawLabel::Int(0), RawLabel::Int(1)],
        }
    }
}

/// Descriptive information about a loaded artifact
#[derive(Debug, Clone, Serialize)]
pub struct ArtifactMetadata {
    pub path: PathBuf,
    pub format: ArtifactFormat,
    pub kind: String,
    pub size_bytes: u64,
    pub checksum: String,
    pub loaded_at: i64,
    pub supports_probability: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feature_names: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classes: Option<Vec<RawLabel>>,
}

/// A deserialized classifier together with where it came from
pub struct ModelArtifact {
    classifier: Box<dyn Classifier>,
    metadata: ArtifactMetadata,
}

impl ModelArtifact {
    /// Wrap an in-memory classifier, e.g. one built by a host for testing
    pub fn new(classifier: Box<dyn Classifier>, path: PathBuf, format: ArtifactFormat, bytes: &[u8]) -> Self {
        let metadata = ArtifactMetadata {
            path,
            format,
            kind: classifier.kind().to_string(),
            size_bytes: bytes.len() as u64,
            checksum: compute_checksum(bytes),
            loaded_at: chrono::Utc::now().timestamp(),
            supports_probability: classifier.probabilities().is_some(),
            feature_names: classifier
                .feature_names()
                .filter(|names| !names.is_empty())
                .map(|names| names.to_vec()),
            classes: classifier.probabilities().map(|p| p.classes().to_vec()),
        };
        Self {
            classifier,
            metadata,
        }
    }

    pub fn classifier(&self) -> &dyn Classifier {
        self.classifier.as_ref()
    }

    pub fn metadata(&self) -> &ArtifactMetadata {
        &self.metadata
    }

    pub fn path(&self) -> &Path {
        &self.metadata.path
    }
}

impl fmt::Debug for ModelArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelArtifact")
            .field("metadata", &self.metadata)
            .finish_non_exhaustive()
    }
}

/// Load an artifact from an existing file
pub fn load_artifact(path: &Path, options: &ArtifactOptions) -> Result<ModelArtifact, LoadError> {
    let format = ArtifactFormat::from_path(path)?;

    let size = fs::metadata(path)
        .map_err(|e| LoadError::Io(e.to_string()))?
        .len();
    if size > options.max_artifact_bytes {
        return Err(LoadError::TooLarge {
            size,
            max: options.max_artifact_bytes,
        });
    }

    let bytes = fs::read(path).map_err(|e| LoadError::Io(e.to_string()))?;
    let classifier = decode(format, &bytes, options)?;
    let artifact = ModelArtifact::new(classifier, path.to_path_buf(), format, &bytes);

    debug!(
        path = %path.display(),
        format = %format,
        kind = %artifact.metadata.kind,
        checksum = %artifact.metadata.checksum,
        "Artifact decoded"
    );
    Ok(artifact)
}

fn decode(
    format: ArtifactFormat,
    bytes: &[u8],
    options: &ArtifactOptions,
) -> Result<Box<dyn Classifier>, LoadError> {
    match format {
        ArtifactFormat::Json => {
            let document: ModelDocument =
                serde_json::from_slice(bytes).map_err(|e| LoadError::Decode(e.to_string()))?;
            document.into_classifier().map_err(LoadError::Invalid)
        }
        ArtifactFormat::Onnx => {
            let classifier = OnnxClassifier::from_bytes(bytes, options.onnx_class_labels.clone())
                .map_err(|e| LoadError::Onnx(format!("{:#}", e)))?;
            Ok(Box::new(classifier))
        }
    }
}

/// Compute SHA256 checksum of data
pub fn compute_checksum(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const LOGISTIC_DOC: &str = r#"{
        "kind": "logistic_regression",
        "feature_names": ["MonthlyIncome", "Age", "TotalWorkingYears", "OverTime_Yes",
            "DailyRate", "YearsAtCompany", "HourlyRate", "DistanceFromHome",
            "MonthlyRate", "NumCompaniesWorked"],
        "classes": [0, 1],
        "coefficients": [0, 0, 0, 2.0, 0, 0, 0, 0, 0, 0],
        "intercept": -1.0
    }"#;

    #[test]
    fn test_compute_checksum() {
        let data = b"test model weights";
        let checksum = compute_checksum(data);
        assert_eq!(checksum.len(), 64); // SHA256 hex is 64 chars
        assert_eq!(checksum, compute_checksum(data));
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(ArtifactFormat::from_path(Path::new("model/rf.onnx")).unwrap(), ArtifactFormat::Onnx);
        assert_eq!(ArtifactFormat::from_path(Path::new("rf.JSON")).unwrap(), ArtifactFormat::Json);
        assert!(matches!(
            ArtifactFormat::from_path(Path::new("rf_model.pkl")),
            Err(LoadError::UnsupportedFormat(ext)) if ext == "pkl"
        ));
    }

    #[test]
    fn test_load_json_artifact() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("model.json");
        fs::write(&path, LOGISTIC_DOC).unwrap();

        let artifact = load_artifact(&path, &ArtifactOptions::default()).unwrap();
        let meta = artifact.metadata();
        assert_eq!(meta.kind, "logistic_regression");
        assert_eq!(meta.format, ArtifactFormat::Json);
        assert!(meta.supports_probability);
        assert_eq!(meta.size_bytes, LOGISTIC_DOC.len() as u64);
        assert_eq!(meta.checksum, compute_checksum(LOGISTIC_DOC.as_bytes()));
        assert_eq!(artifact.path(), path.as_path());
    }

    #[test]
    fn test_corrupt_json_is_decode_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("model.json");
        fs::write(&path, [0xde_u8, 0xad, 0xbe, 0xef]).unwrap();

        assert!(matches!(
            load_artifact(&path, &ArtifactOptions::default()),
            Err(LoadError::Decode(_))
        ));
    }

    #[test]
    fn test_structurally_invalid_document() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("model.json");
        fs::write(
            &path,
            r#"{"kind":"linear_svm","feature_names":[],"classes":[0,1],"coefficients":[1.0],"intercept":0}"#,
        )
        .unwrap();

        assert!(matches!(
            load_artifact(&path, &ArtifactOptions::default()),
            Err(LoadError::Invalid(_))
        ));
    }

    #[test]
    fn test_corrupt_onnx_is_load_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("rf_model.onnx");
        fs::write(&path, b"not an onnx graph").unwrap();

        assert!(matches!(
            load_artifact(&path, &ArtifactOptions::default()),
            Err(LoadError::Onnx(_))
        ));
    }

    #[test]
    fn test_size_limit_enforced() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("model.json");
        fs::write(&path, LOGISTIC_DOC).unwrap();

        let options = ArtifactOptions {
            max_artifact_bytes: 16,
            ..Default::default()
        };
        assert!(matches!(
            load_artifact(&path, &options),
            Err(LoadError::TooLarge { max: 16, .. })
        ));
    }
}
