//! Web server for the to-do list
//!
//! Serves the login and task-list pages on port 8081 by default, backed by a
//! Supabase project or an in-process memory backend.

mod config;
mod routes;
mod session;
mod state;
mod view;

use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::WebConfig;
use crate::session::start_session_sweeper;
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "todo_web=debug,todo_core=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = WebConfig::from_env()?;
    tracing::info!(
        "Using {} backend, table {:?}",
        config.backend.name(),
        config.table
    );

    let state = AppState::new(&config)?;
    start_session_sweeper(Arc::clone(state.sessions()), config.session_idle);

    let app = routes::app(state);

    tracing::info!("Listening on {}", config.bind_addr);
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
