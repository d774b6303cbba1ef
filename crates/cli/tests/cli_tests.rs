//! CLI integration tests

use std::fs;
use std::process::{Command, Output};
use tempfile::TempDir;

/// Stump on OverTime_Yes: overtime means attrition with p = 0.8
const FOREST_DOC: &str = r#"{
    "kind": "random_forest",
    "feature_names": ["MonthlyIncome", "Age", "TotalWorkingYears", "OverTime_Yes",
        "DailyRate", "YearsAtCompany", "HourlyRate", "DistanceFromHome",
        "MonthlyRate", "NumCompaniesWorked"],
    "classes": [0, 1],
    "trees": [{"nodes": [
        {"feature": 3, "threshold": 0.5, "left": 1, "right": 2},
        {"value": [9, 1]},
        {"value": [2, 8]}
    ]}]
}"#;

fn run_cli(args: &[&str]) -> Output {
    Command::new("cargo")
        .args(["run", "-q", "-p", "attrition-cli", "--"])
        .args(args)
        .env_remove("ATTRITION_MODEL_PATHS")
        .output()
        .expect("Failed to execute command")
}

/// Test that the CLI shows help
#[test]
fn test_cli_help() {
    let output = run_cli(&["--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI help should succeed");
    assert!(
        stdout.contains("Employee Attrition Risk"),
        "Should show app name"
    );
    assert!(stdout.contains("predict"), "Should show predict command");
    assert!(stdout.contains("model"), "Should show model command");
    assert!(stdout.contains("schema"), "Should show schema command");
}

/// Test that the CLI shows version
#[test]
fn test_cli_version() {
    let output = run_cli(&["--version"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI version should succeed");
    assert!(stdout.contains("attrition"), "Should show binary name");
}

/// Test predict subcommand help lists every field flag
#[test]
fn test_predict_help() {
    let output = run_cli(&["predict", "--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "Predict help should succeed");
    for flag in [
        "--monthly-income",
        "--age",
        "--total-working-years",
        "--overtime",
        "--daily-rate",
        "--years-at-company",
        "--hourly-rate",
        "--distance-from-home",
        "--monthly-rate",
        "--num-companies-worked",
    ] {
        assert!(stdout.contains(flag), "Should show {} option", flag);
    }
}

/// Test schema output in JSON keeps model column order
#[test]
fn test_schema_json() {
    let output = run_cli(&["schema", "--format", "json"]);
    assert!(output.status.success(), "Schema should succeed");

    let fields: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let names: Vec<&str> = fields
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["name"].as_str().unwrap())
        .collect();
    assert_eq!(
        names,
        [
            "MonthlyIncome",
            "Age",
            "TotalWorkingYears",
            "OverTime",
            "DailyRate",
            "YearsAtCompany",
            "HourlyRate",
            "DistanceFromHome",
            "MonthlyRate",
            "NumCompaniesWorked"
        ]
    );
}

/// Test prediction against a JSON forest artifact
#[test]
fn test_predict_with_model() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("rf_model.json");
    fs::write(&path, FOREST_DOC).unwrap();
    let model = path.to_str().unwrap();

    let output = run_cli(&["predict", "--model", model, "--overtime", "Yes", "--format", "json"]);
    assert!(
        output.status.success(),
        "Predict should succeed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["decision"]["label"], "high_risk");
    assert!((report["decision"]["probability"].as_f64().unwrap() - 0.8).abs() < 1e-9);
    assert_eq!(report["input"][3]["value"], "Yes");
}

/// Test that a missing artifact is reported rather than crashing
#[test]
fn test_predict_without_model_fails_cleanly() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("rf_model.onnx");

    let output = run_cli(&["predict", "--model", missing.to_str().unwrap()]);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(!output.status.success(), "Predict should fail without a model");
    assert!(stderr.contains("Model file not found"), "Should explain: {}", stderr);
}

/// Test that out-of-range input is rejected
#[test]
fn test_predict_rejects_out_of_range_age() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("rf_model.json");
    fs::write(&path, FOREST_DOC).unwrap();

    let output = run_cli(&["predict", "--model", path.to_str().unwrap(), "--age", "12"]);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(!output.status.success(), "Predict should reject age 12");
    assert!(stderr.contains("Age"), "Should name the field: {}", stderr);
}
