use std::{env, net::SocketAddr};

use axum::Router;
use common::utils::logging::init_from_env;
use configs::AppConfig;
use dotenvy::dotenv;
use tracing::{info, warn};

use crate::cors::CorsSettings;
use crate::routes;
use crate::state::ServerState;

/// Initialize logging via shared common utils
fn init_logging() {
    init_from_env();
}

/// Bind address from config, overridable via SERVER_HOST / SERVER_PORT.
fn load_bind_addr(cfg: &AppConfig) -> anyhow::Result<SocketAddr> {
    let host = env::var("SERVER_HOST").unwrap_or_else(|_| cfg.server.host.clone());
    let port = env::var("SERVER_PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(cfg.server.port);
    Ok(format!("{}:{}", host, port).parse()?)
}

/// Public entry: build the app and run the HTTP server
pub async fn run() -> anyhow::Result<()> {
    dotenv().ok();
    init_logging();

    let cfg = AppConfig::load_and_validate()?;
    let state = ServerState::from_config(&cfg)?;
    if state.store.is_none() {
        // Not fatal: the entries endpoint reports this per-request.
        warn!("store not configured (STORE_URL / SERVICE_ROLE_KEY); /entries will answer 500");
    }

    let cors = CorsSettings::new(&cfg.cors.origin);
    let app: Router = routes::build_router(cors, state);

    let addr = load_bind_addr(&cfg)?;
    info!(%addr, "starting entries api");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
