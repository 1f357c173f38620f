use std::error::Error;

use ai_llm_service::telemetry;
use tracing::{Level, info, warn};
use tracing_subscriber::{Layer, filter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Load environment variables from .env file, if there is one.
    let dotenv = dotenvy::dotenv();

    // Workspace crates log through the telemetry layer, everything else
    // (sqlx, hyper, reqwest) through a plain fmt layer.
    let third_party = fmt::layer()
        .with_target(true)
        .with_filter(filter::filter_fn(|meta| {
            !telemetry::is_workspace_target(meta.target())
        }));

    tracing_subscriber::registry()
        .with(telemetry::env_filter_with_level("info", Level::INFO))
        .with(telemetry::layer())
        .with(third_party)
        .try_init()?;

    match dotenv {
        Ok(path) => info!(path = %path.display(), "loaded .env"),
        Err(e) if e.not_found() => {}
        Err(e) => warn!(error = %e, ".env present but unreadable; using process environment"),
    }

    api::start().await?;

    Ok(())
}
