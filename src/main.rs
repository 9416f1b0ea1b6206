//! # Invoice Gateway Main Entry Point
//!
//! Loads configuration, prepares the local store and serves the API.

use std::sync::Arc;

use invoice_gateway::{
    config::ConfigLoader, db, remote::SqlServerDriver, seeds, server::run_server, telemetry,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration from layered env files and variables
    let config = ConfigLoader::new().load()?;

    telemetry::init_tracing(&config)?;

    tracing::info!(profile = %config.profile, "Loaded configuration");
    if let Ok(redacted_json) = config.redacted_json() {
        tracing::debug!(config = %redacted_json, "Effective configuration");
    }

    let db = db::init_pool(&config).await?;
    db::run_migrations(&db).await?;

    if config.seed_sample_profiles
        && let Err(e) = seeds::seed_sample_profiles(&db).await
    {
        tracing::warn!(error = %e, "Sample data seeding failed");
    }

    run_server(Arc::new(config), db, Arc::new(SqlServerDriver)).await
}
