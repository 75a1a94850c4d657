//! HTTP API for the agent.
//!
//! ## Endpoints
//!
//! - `GET /api/health` - Liveness and catalog size
//! - `GET /api/welcome` - Greeting listing the tools
//! - `GET /api/tools` - Tool catalog with input schemas
//! - `POST /api/tools/:name` - Invoke one tool with JSON arguments
//! - `POST /api/chat` - Send an utterance, get the reply
//! - `DELETE /api/sessions/:id` - Drop a session's history

mod routes;
mod sessions;
pub mod types;

pub use sessions::{SessionStore, DEFAULT_MAX_SESSIONS};

use std::sync::Arc;

use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::agent::Agent;
use crate::config::Config;

/// Shared application state.
pub struct AppState {
    pub agent: Arc<Agent>,

    /// Bounded in-memory histories; lost on restart.
    pub sessions: SessionStore,
}

impl AppState {
    pub fn new(agent: Arc<Agent>) -> Self {
        Self::with_session_capacity(agent, DEFAULT_MAX_SESSIONS)
    }

    pub fn with_session_capacity(agent: Arc<Agent>, max_sessions: usize) -> Self {
        Self {
            agent,
            sessions: SessionStore::new(max_sessions),
        }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(routes::health))
        .route("/api/welcome", get(routes::welcome))
        .route("/api/tools", get(routes::list_tools))
        .route("/api/tools/:name", post(routes::call_tool))
        .route("/api/chat", post(routes::chat))
        .route("/api/sessions/:id", delete(routes::delete_session))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the HTTP server.
pub async fn serve(config: Config) -> anyhow::Result<()> {
    let agent = Arc::new(crate::build_agent(&config)?);
    let app = router(Arc::new(AppState::with_session_capacity(
        agent,
        config.max_sessions,
    )));

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(
        "Server listening on {} (max {} sessions)",
        addr,
        config.max_sessions
    );

    axum::serve(listener, app).await?;

    Ok(())
}
