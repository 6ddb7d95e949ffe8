#[macro_use]
mod transaction;

mod api;
mod db;
mod extract;
mod metrics;
mod state;

use crate::db::init_db;
use crate::state::AppState;
use anyhow::Result;
use inventory_common::AppConfig;
use std::sync::Arc;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = AppConfig::from_env()?;
    let db = init_db(&config).await?;
    if !config.audit_in_app {
        warn!("AUDIT_IN_APP=false: bitacora relies on database triggers");
    }

    let state = AppState {
        db: Arc::new(db),
        audit_in_app: config.audit_in_app,
        web_dist_dir: config.web_dist_dir.clone(),
    };

    let listener = tokio::net::TcpListener::bind(&config.api_addr).await?;
    info!("inventory api listening on {}", config.api_addr);
    let app = api::router(state);

    tokio::select! {
        result = axum::serve(listener, app) => {
            if let Err(err) = result {
                warn!("api server exited: {}", err);
            }
        },
        _ = tokio::signal::ctrl_c() => {
            info!("shutdown requested");
        }
    }

    Ok(())
}
