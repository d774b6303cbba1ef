//! Feature schema and record assembly for attrition inference
//!
//! Raw form fields arrive as an unordered mapping. The classifier consumes
//! positional columns, so every record is assembled by walking
//! [`FEATURE_SCHEMA`] rather than by iterating the input mapping.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::debug;

/// Number of input features expected by the model
pub const FEATURE_COUNT: usize = 10;

/// Column order the classifier was trained on
pub const FEATURE_SCHEMA: [&str; FEATURE_COUNT] = [
    "MonthlyIncome",
    "Age",
    "TotalWorkingYears",
    "OverTime_Yes",
    "DailyRate",
    "YearsAtCompany",
    "HourlyRate",
    "DistanceFromHome",
    "MonthlyRate",
    "NumCompaniesWorked",
];

/// Raw field carrying the categorical overtime answer
pub const OVERTIME_FIELD: &str = "OverTime";

/// Raw input field specification, listed in feature order
pub const INPUT_FIELDS: [FieldSpec; FEATURE_COUNT] = [
    FieldSpec::integer("MonthlyIncome", "Monthly Income", 0, 1_000_000, 5000),
    FieldSpec::integer("Age", "Age", 18, 70, 30),
    FieldSpec::integer("TotalWorkingYears", "Total Working Years", 0, 60, 8),
    FieldSpec {
        name: OVERTIME_FIELD,
        label: "OverTime",
        kind: FieldKind::OverTime { default: OverTime::No },
    },
    FieldSpec::integer("DailyRate", "Daily Rate", 0, 20_000, 800),
    FieldSpec::integer("YearsAtCompany", "Years At Company", 0, 60, 5),
    FieldSpec::integer("HourlyRate", "Hourly Rate", 0, 1000, 50),
    FieldSpec::integer("DistanceFromHome", "Distance From Home", 0, 100, 5),
    FieldSpec::integer("MonthlyRate", "Monthly Rate", 0, 300_000, 20000),
    FieldSpec::integer("NumCompaniesWorked", "Num Companies Worked", 0, 50, 2),
];

/// Schema validation failures, raised before the model is invoked
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaError {
    #[error("missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<String>),

    #[error("field `{field}` must be one of \"Yes\" or \"No\" (got {value:?})")]
    InvalidCategory { field: String, value: String },

    #[error("field `{field}` must be a whole number (got {value})")]
    NotAnInteger { field: String, value: String },

    #[error("field `{field}` must be between {min} and {max} (got {value})")]
    OutOfRange {
        field: String,
        value: i64,
        min: i64,
        max: i64,
    },

    #[error("model was trained on features [{}], expected [{}]", .found.join(", "), .expected.join(", "))]
    FeatureMismatch {
        expected: Vec<String>,
        found: Vec<String>,
    },
}

/// Categorical overtime answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OverTime {
    No,
    Yes,
}

impl OverTime {
    /// One-hot `OverTime_Yes` column value
    pub fn encode(self) -> f64 {
        match self {
            OverTime::Yes => 1.0,
            OverTime::No => 0.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OverTime::Yes => "Yes",
            OverTime::No => "No",
        }
    }
}

impl FromStr for OverTime {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Yes" => Ok(OverTime::Yes),
            "No" => Ok(OverTime::No),
            other => Err(SchemaError::InvalidCategory {
                field: OVERTIME_FIELD.to_string(),
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for OverTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Value domain of a raw input field
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldKind {
    Integer { min: i64, max: i64, default: i64 },
    OverTime { default: OverTime },
}

/// Raw input field: name, human label, and accepted domain
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FieldSpec {
    pub name: &'static str,
    pub label: &'static str,
    #[serde(flatten)]
    pub kind: FieldKind,
}

impl FieldSpec {
    const fn integer(name: &'static str, label: &'static str, min: i64, max: i64, default: i64) -> Self {
        Self {
            name,
            label,
            kind: FieldKind::Integer { min, max, default },
        }
    }

    /// Default value the form starts with
    pub fn default_value(&self) -> FieldValue {
        match self.kind {
            FieldKind::Integer { default, .. } => FieldValue::Integer(default),
            FieldKind::OverTime { default } => FieldValue::Text(default.as_str().to_string()),
        }
    }

    /// Validate a raw value and encode it as the model column value
    fn encode(&self, value: &FieldValue) -> Result<f64, SchemaError> {
        match self.kind {
            FieldKind::OverTime { .. } => match value {
                FieldValue::Text(s) => Ok(s.parse::<OverTime>()?.encode()),
                other => Err(SchemaError::InvalidCategory {
                    field: self.name.to_string(),
                    value: other.to_string(),
                }),
            },
            FieldKind::Integer { min, max, .. } => {
                let v = value.as_integer().ok_or_else(|| SchemaError::NotAnInteger {
                    field: self.name.to_string(),
                    value: value.to_string(),
                })?;
                if v < min || v > max {
                    return Err(SchemaError::OutOfRange {
                        field: self.name.to_string(),
                        value: v,
                        min,
                        max,
                    });
                }
                Ok(v as f64)
            }
        }
    }
}

/// A raw, already type-coerced form value
///
/// Any other JSON value (null, boolean, array, object) lands in `Other` so
/// that unknown keys can be ignored and bad values for known fields are
/// reported as schema errors instead of failing the whole mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Integer(i64),
    Number(f64),
    Text(String),
    Other(serde_json::Value),
}

impl FieldValue {
    fn as_integer(&self) -> Option<i64> {
        match self {
            FieldValue::Integer(v) => Some(*v),
            FieldValue::Number(v) if v.is_finite() && v.fract() == 0.0 => Some(*v as i64),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Integer(v) => write!(f, "{}", v),
            FieldValue::Number(v) => write!(f, "{}", v),
            FieldValue::Text(s) => write!(f, "{:?}", s),
            FieldValue::Other(v) => write!(f, "{}", v),
        }
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Integer(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::Text(v.to_string())
    }
}

/// Unordered raw field mapping as supplied by the presentation layer
pub type RawFields = HashMap<String, FieldValue>;

/// Raw field mapping pre-filled with the form defaults
pub fn default_raw_fields() -> RawFields {
    INPUT_FIELDS
        .iter()
        .map(|spec| (spec.name.to_string(), spec.default_value()))
        .collect()
}

/// Single ordered row presented to the classifier
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureRecord {
    values: [f64; FEATURE_COUNT],
}

impl FeatureRecord {
    /// Validate a raw field mapping and assemble it in schema order
    pub fn from_raw(raw: &RawFields) -> Result<Self, SchemaError> {
        let missing: Vec<String> = INPUT_FIELDS
            .iter()
            .filter(|spec| !raw.contains_key(spec.name))
            .map(|spec| spec.name.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(SchemaError::MissingFields(missing));
        }

        for key in raw.keys() {
            if !INPUT_FIELDS.iter().any(|spec| spec.name == key) {
                debug!(field = %key, "Ignoring unknown input field");
            }
        }

        let mut values = [0.0; FEATURE_COUNT];
        for (slot, spec) in values.iter_mut().zip(INPUT_FIELDS.iter()) {
            // presence checked above
            if let Some(value) = raw.get(spec.name) {
                *slot = spec.encode(value)?;
            }
        }

        Ok(Self { values })
    }

    /// Build a record from already encoded column values in schema order
    pub fn from_features(values: [f64; FEATURE_COUNT]) -> Self {
        Self { values }
    }

    pub fn values(&self) -> &[f64; FEATURE_COUNT] {
        &self.values
    }

    pub fn get(&self, feature: &str) -> Option<f64> {
        FEATURE_SCHEMA
            .iter()
            .position(|name| *name == feature)
            .map(|idx| self.values[idx])
    }

    /// Column/value pairs in schema order
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        FEATURE_SCHEMA.iter().copied().zip(self.values.iter().copied())
    }

    pub fn to_f32(&self) -> [f32; FEATURE_COUNT] {
        self.values.map(|v| v as f32)
    }
}

/// Check that an artifact's declared training columns match [`FEATURE_SCHEMA`] exactly
pub fn check_feature_names(declared: &[String]) -> Result<(), SchemaError> {
    let matches = declared.len() == FEATURE_COUNT
        && declared.iter().zip(FEATURE_SCHEMA.iter()).all(|(a, b)| a == b);
    if matches {
        Ok(())
    } else {
        Err(SchemaError::FeatureMismatch {
            expected: FEATURE_SCHEMA.iter().map(|s| s.to_string()).collect(),
            found: declared.to_vec(),
        })
    }
}
