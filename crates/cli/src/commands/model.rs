//! Model artifact inspection command

use anyhow::Result;
use attrition_lib::{ArtifactMetadata, ModelStatus};
use chrono::{TimeZone, Utc};
use std::path::PathBuf;

use crate::output::{
    format_bytes, print_error, print_info, print_json, print_success, print_warning,
    render_table, OutputFormat, PropertyRow,
};

fn metadata_rows(meta: &ArtifactMetadata) -> Vec<PropertyRow> {
    let loaded_at = Utc
        .timestamp_opt(meta.loaded_at, 0)
        .single()
        .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| meta.loaded_at.to_string());

    let mut rows = vec![
        PropertyRow::new("Path", meta.path.display().to_string()),
        PropertyRow::new("Format", meta.format.to_string()),
        PropertyRow::new("Kind", meta.kind.clone()),
        PropertyRow::new("Size", format_bytes(meta.size_bytes)),
        PropertyRow::new("SHA-256", meta.checksum.clone()),
        PropertyRow::new("Loaded", loaded_at),
        PropertyRow::new(
            "Probabilities",
            if meta.supports_probability { "yes" } else { "no" },
        ),
    ];
    if let Some(classes) = &meta.classes {
        let classes: Vec<String> = classes.iter().map(|c| c.to_string()).collect();
        rows.push(PropertyRow::new("Classes", classes.join(", ")));
    }
    if let Some(names) = &meta.feature_names {
        rows.push(PropertyRow::new("Features", names.join(", ")));
    }
    rows
}

/// Resolve the artifact and print where it came from
pub fn show_model(candidates: Vec<PathBuf>, format: OutputFormat) -> Result<()> {
    let service = super::service(candidates)?;
    let status = service.status();

    if format == OutputFormat::Json {
        return print_json(&status);
    }

    match &status {
        ModelStatus::Loaded { artifact } => {
            print_success(&format!("Model loaded from: {}", artifact.path.display()));
            println!("{}", render_table(metadata_rows(artifact)));
        }
        ModelStatus::NotFound { searched, .. } => {
            print_warning("Model file not found. Expected at one of:");
            for path in searched {
                println!("  - {}", path.display());
            }
            print_info("Pass --model PATH or set ATTRITION_MODEL_PATHS to point at an artifact");
        }
        ModelStatus::LoadError { message, .. } => print_error(message),
    }

    Ok(())
}
