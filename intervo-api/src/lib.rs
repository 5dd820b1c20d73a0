//! Intervo API server
//!
//! Real-time interview session core: REST endpoints for session creation and
//! retrieval, a WebSocket gateway for the live interview flow, and the
//! orchestrator driving the session state machine.

pub mod api;
pub mod auth;
pub mod clients;
pub mod config;
pub mod db;
pub mod error;
pub mod gateway;
pub mod orchestrator;
pub mod rooms;

use axum::routing::{get, post};
use axum::Router;
use config::Config;
use orchestrator::Orchestrator;
use rooms::RoomRegistry;
use std::sync::Arc;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub rooms: Arc<RoomRegistry>,
    pub orchestrator: Arc<Orchestrator>,
}

/// Build the service router
pub fn build_router(state: AppState) -> Router {
    let uploads = ServeDir::new(&state.config.storage_dir);

    Router::new()
        .route("/healthz", get(api::health::healthz))
        .route("/api/v1/interviews", post(api::interviews::create_interview))
        .route("/api/v1/interviews/:session_id", get(api::interviews::get_interview))
        .route("/ws", get(gateway::ws_handler))
        .nest_service("/uploads", uploads)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
