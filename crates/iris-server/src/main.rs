mod configuration;
mod error;
mod routes;
mod state;

use anyhow::Context;
use iris::providers::factory;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;
use tracing_subscriber::EnvFilter;

use std::path::Path;

use crate::configuration::Settings;
use crate::state::AppState;

fn log_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // env files may set RUST_LOG, so they load before the subscriber
    configuration::load_env_files(Path::new("."));

    // Initialize tracing for logging
    tracing_subscriber::fmt().with_env_filter(log_filter()).init();

    // Missing credentials are fatal before any traffic is served
    let settings = Settings::new().context("Failed to load configuration")?;
    let addr = settings
        .server
        .socket_addr()
        .context("Invalid server host or port")?;

    let state = AppState::new(
        factory::get_provider(settings.doubao.into_config())?,
        factory::get_provider(settings.qwen.into_config())?,
        settings.server.environment.clone(),
    );

    let mut app = routes::configure(state);
    if let Some(dir) = &settings.server.static_dir {
        info!("serving chat client from {}", dir.display());
        app = routes::assets::attach(app, dir);
    }

    // Create router with CORS support
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);
    let app = app.layer(cors);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(
        "Server is running in {} mode on http://{}",
        settings.server.environment,
        listener.local_addr()?
    );
    axum::serve(listener, app).await?;
    Ok(())
}
