use std::path::PathBuf;

use anyhow::{Context, Result};
use axum::Router;
use estate_common::lifecycle::DEFAULT_OVERDUE_DAYS;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use super::api::{self, AppState, SharedState};
use super::db::{CrmDb, DbHandle};

/// Configuration for the CRM server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub dev_mode: bool,
    pub overdue_days: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            db_path: PathBuf::from("data/estate-crm.db"),
            dev_mode: false,
            overdue_days: DEFAULT_OVERDUE_DAYS,
        }
    }
}

/// Build the full application router: API routes plus request tracing,
/// and permissive CORS for a local front-end dev server when `dev_mode` is set.
pub fn build_router(state: SharedState, dev_mode: bool) -> Router {
    let mut app = api::api_router()
        .with_state(state)
        .layer(TraceLayer::new_for_http());
    if dev_mode {
        app = app.layer(CorsLayer::permissive());
    }
    app
}

/// Start the CRM server and run until Ctrl-C.
pub async fn start_server(config: ServerConfig) -> Result<()> {
    let db = CrmDb::new(&config.db_path).with_context(|| {
        format!("Failed to open CRM database at {}", config.db_path.display())
    })?;
    let state = AppState::new(DbHandle::new(db), config.overdue_days);
    let app = build_router(state, config.dev_mode);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    let local_addr = listener.local_addr()?;
    info!(
        addr = %local_addr,
        db = %config.db_path.display(),
        dev_mode = config.dev_mode,
        "Estate CRM listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shut down gracefully");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for Ctrl-C; shutting down");
        return;
    }
    info!("Shutting down...");
}
