//! CLI command implementations

pub mod model;
pub mod predict;
pub mod schema;

use anyhow::{Context, Result};
use attrition_lib::{AttritionService, ModelResolver};
use std::path::PathBuf;

/// Build a scoring service over the given candidate paths
pub fn service(candidates: Vec<PathBuf>) -> Result<AttritionService> {
    let resolver = ModelResolver::new(candidates).context("No model candidate paths given")?;
    Ok(AttritionService::new(resolver, "cli"))
}
