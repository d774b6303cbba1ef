//! Attrition server - HTTP API for employee attrition risk scoring
//!
//! Resolves the trained classifier at startup and serves predictions,
//! model status, health and metrics.

use anyhow::{Context, Result};
use attrition_lib::{health::HealthRegistry, AttritionService, ModelStatus};
use attrition_server::{api, ServiceConfig};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const SERVICE_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!("Starting attrition-server");

    let config = ServiceConfig::load()?;
    info!(instance = %config.instance, port = config.port, "Service configured");

    let resolver = config.resolver()?;
    let service = Arc::new(AttritionService::new(resolver, config.instance.clone()));
    service
        .logger()
        .log_startup(SERVICE_VERSION, service.resolver().candidates());

    let health_registry = HealthRegistry::new();

    let app_state = Arc::new(api::AppState::new(service.clone(), health_registry.clone()));

    // Resolve eagerly so a missing artifact shows up in health before the first request
    let startup = service.clone();
    let resolution = tokio::task::spawn_blocking(move || startup.resolution())
        .await
        .context("Startup model resolution panicked")?;
    health_registry.record_resolution(&resolution).await;
    info!(status = ?ModelStatus::from(&resolution), "Startup model resolution finished");

    health_registry.set_ready(true).await;

    let api_handle = tokio::spawn(api::serve(config.port, app_state));

    tokio::select! {
        result = api_handle => {
            match result {
                Ok(Ok(())) => info!("API server exited"),
                Ok(Err(e)) => {
                    error!(error = %e, "API server failed");
                    return Err(e);
                }
                Err(e) => return Err(e).context("API server task panicked"),
            }
        }
        signal = tokio::signal::ctrl_c() => {
            signal.context("Failed to listen for shutdown signal")?;
            service.logger().log_shutdown("SIGINT received");
            info!("Shutting down");
        }
    }

    Ok(())
}
