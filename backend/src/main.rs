//! Backend entry-point: loads settings, wires adapters and serves the API.

mod server;

use actix_web::web;
use color_eyre::eyre::{Result, WrapErr, eyre};
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use gratitude_backend::inbound::http::health::HealthState;
use gratitude_backend::settings::AppSettings;
use server::{Running, ServerConfig, create_server};

/// Application bootstrap.
#[actix_web::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = AppSettings::load().map_err(|err| eyre!("failed to load settings: {err}"))?;
    let runtime = settings.validate().wrap_err("invalid settings")?;

    let health_state = web::Data::new(HealthState::new());
    let Running { server, workers } = create_server(health_state.clone(), ServerConfig::new(runtime))
        .await
        .wrap_err("failed to start server")?;

    let result = server.await;
    health_state.mark_unhealthy();
    for worker in workers {
        worker.abort();
    }
    info!("server stopped");
    result.wrap_err("server terminated with an error")
}
