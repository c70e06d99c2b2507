//! Standalone REST API server binary.
//!
//! ## Purpose
//! Runs the REST API server on its own.
//!
//! ## Intended use
//! Useful for development and debugging when you only want the REST server
//! (with OpenAPI/Swagger UI). Production deployments use the workspace's
//! main `retria-run` binary.

use retria_core::CoreConfig;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point for the Retria REST API server.
///
/// # Environment Variables
/// - `RETRIA_REST_ADDR`: Server address (default: "0.0.0.0:3000")
/// - `RETRIA_DATA_DIR`: Data directory (default: "/retria_data"); must exist
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - the data directory does not exist,
/// - the server address cannot be bound, or
/// - the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr = std::env::var("RETRIA_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());

    tracing::info!("-- Starting Retria REST API on {}", addr);

    let data_dir = std::env::var("RETRIA_DATA_DIR")
        .unwrap_or_else(|_| retria_core::config::DEFAULT_DATA_DIR.into());
    let data_path = Path::new(&data_dir);
    if !data_path.exists() {
        anyhow::bail!("Data directory does not exist: {}", data_path.display());
    }

    let cfg = Arc::new(CoreConfig::new(data_path.to_path_buf())?);
    api_rest::serve(cfg, &addr).await
}
