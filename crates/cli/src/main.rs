//! Attrition risk CLI
//!
//! Scores a single employee record against a local model artifact and
//! inspects the artifact and input schema.

mod commands;
mod config;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{model, predict, schema};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Employee attrition risk CLI
#[derive(Parser)]
#[command(name = "attrition")]
#[command(author, version, about = "CLI for Employee Attrition Risk scoring", long_about = None)]
pub struct Cli {
    /// Model artifact path; repeat to give several candidates in priority order
    #[arg(long = "model", global = true, env = "ATTRITION_MODEL_PATHS", value_delimiter = ',')]
    pub models: Vec<PathBuf>,

    /// Output format (defaults to the config file setting, then table)
    #[arg(long, short, global = true)]
    pub format: Option<output::OutputFormat>,

    /// Enable verbose output
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Predict attrition risk for one employee
    Predict(predict::PredictArgs),

    /// Show which model artifact is resolved
    Model,

    /// Show the input fields, their order and bounds
    Schema,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.verbose {
        tracing_subscriber::fmt()
            .compact()
            .with_writer(std::io::stderr)
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
            )
            .init();
    }

    let config = config::Config::load()?;
    let format = cli
        .format
        .unwrap_or_else(|| output::OutputFormat::from_config(config.default_format.as_deref()));
    let candidates = config.candidates(&cli.models);

    match cli.command {
        Commands::Predict(args) => predict::run(&args, candidates, format)?,
        Commands::Model => model::show_model(candidates, format)?,
        Commands::Schema => schema::show_schema(format)?,
    }

    Ok(())
}
