//! Input schema listing command

use anyhow::Result;
use attrition_lib::predictor::{FieldKind, INPUT_FIELDS};
use tabled::Tabled;

use crate::output::{print_json, render_table, OutputFormat};

/// Row for the schema table
#[derive(Tabled)]
struct FieldRow {
    #[tabled(rename = "#")]
    position: usize,
    #[tabled(rename = "Field")]
    name: &'static str,
    #[tabled(rename = "Label")]
    label: &'static str,
    #[tabled(rename = "Accepts")]
    accepts: String,
    #[tabled(rename = "Default")]
    default: String,
}

fn rows() -> Vec<FieldRow> {
    INPUT_FIELDS
        .iter()
        .enumerate()
        .map(|(i, spec)| {
            let (accepts, default) = match spec.kind {
                FieldKind::Integer { min, max, default } => {
                    (format!("integer {}..={}", min, max), default.to_string())
                }
                FieldKind::OverTime { default } => ("Yes | No".to_string(), default.to_string()),
            };
            FieldRow {
                position: i + 1,
                name: spec.name,
                label: spec.label,
                accepts,
                default,
            }
        })
        .collect()
}

/// Print the input fields in model column order
pub fn show_schema(format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(&INPUT_FIELDS[..]),
        OutputFormat::Table => {
            println!("{}", render_table(rows()));
            Ok(())
        }
    }
}
