//! Main entry point for the Retria referral triage server.
//!
//! Resolves configuration from the environment, initialises tracing, and
//! runs the REST API (intake, decision workflow, classifier administration,
//! reporting, notifications).

use retria_core::CoreConfig;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// # Environment Variables
/// - `RETRIA_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `RETRIA_DATA_DIR`: Directory for referral data storage
///   (default: "/retria_data"); must already exist
///
/// # Returns
/// * `Ok(())` - If the server starts and runs successfully
/// * `Err(anyhow::Error)` - If startup or runtime fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("retria=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr = std::env::var("RETRIA_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    let data_dir = std::env::var("RETRIA_DATA_DIR")
        .unwrap_or_else(|_| retria_core::config::DEFAULT_DATA_DIR.into());

    tracing::info!("++ Starting Retria REST on {}", rest_addr);
    tracing::info!("++ Using data directory {}", data_dir);

    let data_path = Path::new(&data_dir);
    if !data_path.exists() {
        anyhow::bail!("Data directory does not exist: {}", data_path.display());
    }
    let cfg = Arc::new(CoreConfig::new(data_path.to_path_buf())?);

    api_rest::serve(cfg, &rest_addr).await
}
