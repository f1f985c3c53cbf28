use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::{router, AppState};
use openroom_core::config::{flag_from_env_value, stay_policy_from_env_value};
use openroom_core::constants::{DEFAULT_DATASET_PATH, DEFAULT_REST_ADDR};
use openroom_core::{open_backend, CoreConfig};

/// Main entry point for the OpenRoom application
///
/// Loads the dataset into the in-memory backend and serves the REST API with Swagger UI at
/// `/swagger-ui`.
///
/// # Environment Variables
/// - `OPENROOM_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `OPENROOM_DATA`: Dataset YAML file (default: "seed/demo.yaml")
/// - `OPENROOM_PERSIST`: Write inserts back to the dataset file (default: false)
/// - `OPENROOM_STAY_POLICY`: `since-admission` (default) or `end-at-discharge`
///
/// # Returns
/// * `Ok(())` - If the server starts and runs successfully
/// * `Err(anyhow::Error)` - If configuration, dataset loading, or the server fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("openroom=info".parse()?)
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr =
        std::env::var("OPENROOM_REST_ADDR").unwrap_or_else(|_| DEFAULT_REST_ADDR.into());
    let dataset = std::env::var("OPENROOM_DATA").unwrap_or_else(|_| DEFAULT_DATASET_PATH.into());
    let persist = flag_from_env_value("OPENROOM_PERSIST", std::env::var("OPENROOM_PERSIST").ok())?;
    let stay_policy = stay_policy_from_env_value(std::env::var("OPENROOM_STAY_POLICY").ok())?;

    let cfg = Arc::new(CoreConfig::new(
        Some(PathBuf::from(dataset)),
        persist,
        stay_policy,
    )?);
    let client = open_backend(&cfg)?;

    tracing::info!("++ Starting OpenRoom REST on {}", rest_addr);

    let app = router(AppState::new(cfg, client));
    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
