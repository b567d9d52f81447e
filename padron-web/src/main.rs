//! padron-web - beneficiary registration service
//!
//! Resolves configuration (CLI, TOML file, environment, defaults), opens or
//! creates the SQLite database, and serves the JSON API.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use padron_common::config::{ConfigOverrides, PadronConfig};
use padron_common::db::init_database;
use padron_web::services::ocr_client::OcrClient;
use padron_web::{build_router, AppState};
use tracing::info;

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(name = "padron-web")]
#[command(about = "Beneficiary registration service")]
#[command(version)]
struct Args {
    /// Configuration file (TOML)
    #[arg(short, long, env = "PADRON_CONFIG")]
    config: Option<PathBuf>,

    /// SQLite database path
    #[arg(short, long, env = "PADRON_DATABASE")]
    database: Option<PathBuf>,

    /// Listen address (host:port)
    #[arg(short, long, env = "PADRON_BIND")]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = PadronConfig::load(&ConfigOverrides {
        config_file: args.config,
        database_path: args.database,
        bind_addr: args.bind,
    })
    .context("Failed to load configuration")?;

    // RUST_LOG wins over the configured level
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!(
        "Starting padron-web v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    info!("Database path: {}", config.database_path.display());
    info!("OCR service: {}", config.ocr.url);

    let pool = init_database(&config.database_path)
        .await
        .context("Failed to initialize database")?;
    let ocr = OcrClient::new(&config.ocr).context("Failed to build OCR client")?;

    let app = build_router(AppState::new(pool, ocr));

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;
    info!("padron-web listening on http://{}", config.bind_addr);
    info!("Health check: http://{}/health", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
