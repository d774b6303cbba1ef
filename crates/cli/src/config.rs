//! Configuration management for the CLI

use anyhow::{Context, Result};
use attrition_lib::DEFAULT_CANDIDATES;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// CLI configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Artifact candidate paths, in priority order
    pub model_paths: Option<Vec<String>>,
    /// Default output format
    pub default_format: Option<String>,
}

impl Config {
    /// Load configuration from file
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        serde_json::from_str(&content).context("Failed to parse config file")
    }

    /// Candidate list: command line first, then config file, then built-in defaults
    pub fn candidates(&self, overrides: &[PathBuf]) -> Vec<PathBuf> {
        if !overrides.is_empty() {
            return overrides.to_vec();
        }
        match &self.model_paths {
            Some(paths) if !paths.is_empty() => paths.iter().map(PathBuf::from).collect(),
            _ => DEFAULT_CANDIDATES.iter().map(PathBuf::from).collect(),
        }
    }

    /// Get the configuration file path
    fn config_path() -> Option<PathBuf> {
        let home = dirs_next::home_dir()?;
        Some(home.join(".config").join("attrition").join("config.json"))
    }
}
