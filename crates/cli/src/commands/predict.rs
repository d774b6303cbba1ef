//! Single-record prediction command

use anyhow::{Context, Result};
use attrition_lib::{
    predictor::{FieldValue, INPUT_FIELDS},
    Decision, RawFields,
};
use clap::Args;
use serde::Serialize;
use std::path::PathBuf;

use crate::output::{
    color_label, format_probability, print_json, print_warning, render_table, OutputFormat,
    PropertyRow,
};

/// Employee attributes; omitted values take the schema default
#[derive(Args, Debug, Default)]
pub struct PredictArgs {
    /// Monthly income
    #[arg(long)]
    pub monthly_income: Option<i64>,

    /// Age in years
    #[arg(long)]
    pub age: Option<i64>,

    /// Total working years
    #[arg(long)]
    pub total_working_years: Option<i64>,

    /// Works overtime (Yes or No)
    #[arg(long)]
    pub overtime: Option<String>,

    /// Daily rate
    #[arg(long)]
    pub daily_rate: Option<i64>,

    /// Years at the company
    #[arg(long)]
    pub years_at_company: Option<i64>,

    /// Hourly rate
    #[arg(long)]
    pub hourly_rate: Option<i64>,

    /// Distance from home
    #[arg(long)]
    pub distance_from_home: Option<i64>,

    /// Monthly rate
    #[arg(long)]
    pub monthly_rate: Option<i64>,

    /// Number of companies worked at
    #[arg(long)]
    pub num_companies_worked: Option<i64>,
}

impl PredictArgs {
    fn value_for(&self, field: &str) -> Option<FieldValue> {
        let integer = match field {
            "MonthlyIncome" => self.monthly_income,
            "Age" => self.age,
            "TotalWorkingYears" => self.total_working_years,
            "DailyRate" => self.daily_rate,
            "YearsAtCompany" => self.years_at_company,
            "HourlyRate" => self.hourly_rate,
            "DistanceFromHome" => self.distance_from_home,
            "MonthlyRate" => self.monthly_rate,
            "NumCompaniesWorked" => self.num_companies_worked,
            "OverTime" => return self.overtime.as_deref().map(FieldValue::from),
            _ => None,
        };
        integer.map(FieldValue::from)
    }

    /// Raw field mapping in schema order, defaults filled in
    pub fn to_entries(&self) -> Vec<InputEntry> {
        INPUT_FIELDS
            .iter()
            .map(|spec| InputEntry {
                field: spec.name,
                value: self.value_for(spec.name).unwrap_or_else(|| spec.default_value()),
            })
            .collect()
    }
}

/// One submitted input value
#[derive(Debug, Serialize)]
pub struct InputEntry {
    pub field: &'static str,
    pub value: FieldValue,
}

#[derive(Serialize)]
struct PredictionReport<'a> {
    input: &'a [InputEntry],
    decision: &'a Decision,
}

fn display_value(value: &FieldValue) -> String {
    match value {
        FieldValue::Integer(v) => v.to_string(),
        FieldValue::Number(v) => v.to_string(),
        FieldValue::Text(s) => s.clone(),
        FieldValue::Other(v) => v.to_string(),
    }
}

/// Score the record and print the decision
pub fn run(args: &PredictArgs, candidates: Vec<PathBuf>, format: OutputFormat) -> Result<()> {
    let service = super::service(candidates)?;

    let entries = args.to_entries();
    let raw: RawFields = entries
        .iter()
        .map(|e| (e.field.to_string(), e.value.clone()))
        .collect();

    let decision = service.assess(&raw).context("Prediction failed")?;

    match format {
        OutputFormat::Json => print_json(&PredictionReport {
            input: &entries,
            decision: &decision,
        })?,
        OutputFormat::Table => {
            let rows: Vec<PropertyRow> = INPUT_FIELDS
                .iter()
                .zip(&entries)
                .map(|(spec, entry)| PropertyRow::new(spec.label, display_value(&entry.value)))
                .collect();
            println!("{}", render_table(rows));
            println!();
            println!("Prediction: {}", color_label(decision.label));
            match decision.probability {
                Some(p) => println!("Probability of attrition: {}", format_probability(p)),
                None => print_warning("Model does not report probabilities"),
            }
        }
    }

    Ok(())
}
