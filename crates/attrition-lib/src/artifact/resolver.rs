//! Candidate-path resolution with a load-once cache

use super::{load_artifact, ArtifactOptions, LoadError, ModelArtifact};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Deployment locations searched when none are configured, in priority order
pub const DEFAULT_CANDIDATES: [&str; 4] = [
    "model/rf_model.onnx",
    "rf_model.onnx",
    "model/rf_model.json",
    "rf_model.json",
];

#[derive(Debug, Clone, Error)]
pub enum ResolveError {
    #[error("at least one candidate artifact path must be configured")]
    NoCandidates,
}

/// Outcome of searching the candidate paths
#[derive(Debug, Clone)]
pub enum ResolutionResult {
    Loaded {
        artifact: Arc<ModelArtifact>,
        path: PathBuf,
    },
    NotFound {
        searched: Vec<PathBuf>,
    },
    LoadError {
        path: PathBuf,
        cause: LoadError,
    },
}

impl ResolutionResult {
    pub fn artifact(&self) -> Option<&Arc<ModelArtifact>> {
        match self {
            ResolutionResult::Loaded { artifact, .. } => Some(artifact),
            _ => None,
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, ResolutionResult::Loaded { .. })
    }

    /// Human-readable summary suitable for display
    pub fn message(&self) -> String {
        match self {
            ResolutionResult::Loaded { path, .. } => {
                format!("Model loaded from: {}", path.display())
            }
            ResolutionResult::NotFound { searched } => {
                let list: Vec<String> = searched
                    .iter()
                    .map(|p| format!(" - {}", p.display()))
                    .collect();
                format!("Model file not found. Expected at one of:\n{}", list.join("\n"))
            }
            ResolutionResult::LoadError { path, cause } => {
                format!("Failed to load model at {}: {}", path.display(), cause)
            }
        }
    }
}

/// Searches ordered candidate paths for a model artifact and owns the loaded model
///
/// The first existing candidate wins, even if it then fails to load; later
/// candidates are never consulted. Only successful loads are cached, so a
/// missing or corrupt artifact is retried on the next call.
#[derive(Debug)]
pub struct ModelResolver {
    candidates: Vec<PathBuf>,
    options: ArtifactOptions,
    cached: RwLock<Option<Arc<ModelArtifact>>>,
}

impl ModelResolver {
    pub fn new(candidates: Vec<PathBuf>) -> Result<Self, ResolveError> {
        Self::with_options(candidates, ArtifactOptions::default())
    }

    pub fn with_options(candidates: Vec<PathBuf>, options: ArtifactOptions) -> Result<Self, ResolveError> {
        if candidates.is_empty() {
            return Err(ResolveError::NoCandidates);
        }
        Ok(Self {
            candidates,
            options,
            cached: RwLock::new(None),
        })
    }

    /// Resolver over [`DEFAULT_CANDIDATES`]
    pub fn with_defaults() -> Self {
        Self {
            candidates: DEFAULT_CANDIDATES.iter().map(PathBuf::from).collect(),
            options: ArtifactOptions::default(),
            cached: RwLock::new(None),
        }
    }

    pub fn candidates(&self) -> &[PathBuf] {
        &self.candidates
    }

    /// First existing candidate, if any
    pub fn locate(&self) -> Option<&Path> {
        self.candidates
            .iter()
            .map(PathBuf::as_path)
            .find(|p| p.exists())
    }

    /// Resolve without consulting or updating the cache
    pub fn resolve(&self) -> ResolutionResult {
        let Some(path) = self.locate() else {
            warn!(candidates = self.candidates.len(), "No model artifact found");
            return ResolutionResult::NotFound {
                searched: self.candidates.clone(),
            };
        };

        debug!(path = %path.display(), "Found model artifact candidate");
        match load_artifact(path, &self.options) {
            Ok(artifact) => {
                info!(
                    path = %path.display(),
                    kind = %artifact.metadata().kind,
                    checksum = %artifact.metadata().checksum,
                    "Model artifact loaded"
                );
                ResolutionResult::Loaded {
                    artifact: Arc::new(artifact),
                    path: path.to_path_buf(),
                }
            }
            Err(cause) => {
                error!(path = %path.display(), error = %cause, "Failed to load model artifact");
                ResolutionResult::LoadError {
                    path: path.to_path_buf(),
                    cause,
                }
            }
        }
    }

    /// Cached artifact, resolving on first use
    pub fn artifact(&self) -> ResolutionResult {
        if let Some(artifact) = self.read().as_ref() {
            return loaded(artifact);
        }

        let mut cached = self.write();
        // another caller may have loaded it while we waited
        if let Some(artifact) = cached.as_ref() {
            return loaded(artifact);
        }

        let result = self.resolve();
        if let Some(artifact) = result.artifact() {
            *cached = Some(artifact.clone());
        }
        result
    }

    /// Currently cached artifact without triggering resolution
    pub fn cached(&self) -> Option<Arc<ModelArtifact>> {
        self.read().clone()
    }

    /// Drop the cached artifact so the next call re-resolves
    pub fn invalidate(&self) {
        if self.write().take().is_some() {
            info!("Model artifact cache invalidated");
        }
    }

    /// Invalidate and resolve again
    pub fn reload(&self) -> ResolutionResult {
        self.invalidate();
        self.artifact()
    }

    fn read(&self) -> RwLockReadGuard<'_, Option<Arc<ModelArtifact>>> {
        self.cached.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Option<Arc<ModelArtifact>>> {
        self.cached.write().unwrap_or_else(|e| e.into_inner())
    }
}

fn loaded(artifact: &Arc<ModelArtifact>) -> ResolutionResult {
    ResolutionResult::Loaded {
        artifact: artifact.clone(),
        path: artifact.path().to_path_buf(),
    }
}
