//! CropSight Server
//!
//! HTTP API for crop disease diagnosis. Loads one model per configured crop
//! at startup and exposes a prediction endpoint for each.

mod envelope;
mod routes;
mod state;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use cropsight::backend::backend_name;
use cropsight::config::CONFIG_ENV;
use cropsight::utils::logging::{init_logging, LogConfig, LogLevel};
use cropsight::ServiceConfig;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::state::AppState;

/// CropSight Server
#[derive(Parser, Debug)]
#[command(name = "cropsight-server")]
#[command(version)]
#[command(about = "HTTP API for crop disease diagnosis")]
struct Cli {
    /// Port to listen on
    #[arg(short, long, default_value = "8080", env = "CROPSIGHT_PORT")]
    port: u16,

    /// Host to bind to
    #[arg(long, default_value = "0.0.0.0", env = "CROPSIGHT_HOST")]
    host: String,

    /// Service configuration file
    #[arg(short, long, env = CONFIG_ENV)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "CROPSIGHT_LOG_LEVEL")]
    log_level: String,

    /// Enable debug logging (overrides --log-level)
    #[arg(short, long, default_value = "false")]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Initialize logging
    let level = if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::from_name(&cli.log_level)
    };
    if let Err(e) = init_logging(&LogConfig::production().with_level(level)) {
        eprintln!("{}", e);
    }

    let config = match &cli.config {
        Some(path) => ServiceConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ServiceConfig::default(),
    };

    info!("CropSight Server v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration:");
    info!("  Backend:    {}", backend_name());
    info!("  Threshold:  {:.1}%", config.confidence_threshold);
    info!("  Image size: {}", config.image_size);
    info!("  Catalog:    {:?}", config.catalog_path);
    for crop in &config.crops {
        info!("  {:<10}  {} model, {:?}", crop.crop, crop.variant, crop.weights_path);
    }

    // Models are loaded once; a failure here means the server never starts
    let state = Arc::new(AppState::from_config(config).context("loading models")?);
    if state.config.catalog_path.is_none() {
        warn!("No catalog configured, responses will carry no products");
    }

    // Build router
    let app = routes::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );

    // Start server
    let addr: SocketAddr = format!("{}:{}", cli.host, cli.port).parse()?;
    info!("Starting server on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
