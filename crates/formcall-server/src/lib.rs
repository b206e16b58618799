//! formcall server library logic.

pub mod api;
pub mod api_sessions;
pub mod api_sse;
pub mod api_tools;
pub mod api_ws;
pub mod config;
pub mod session;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Extension, Json, Router,
};
use formcall_voice::{AgentConfig, VoiceService};
use serde_json::{json, Value};
use session::SessionRegistry;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Live sessions.
    pub sessions: SessionRegistry,
    /// LiveKit room and token service.
    pub voice_service: Arc<VoiceService>,
    /// Agent persona and pipeline settings.
    pub agent_config: Arc<AgentConfig>,
    /// Per-participant data-channel backlog.
    pub data_channel_capacity: usize,
}

impl AppState {
    pub fn new(config: &config::Config) -> Self {
        Self {
            sessions: SessionRegistry::new(),
            voice_service: Arc::new(VoiceService::new(config.livekit.clone())),
            agent_config: Arc::new(config.agent.clone()),
            data_channel_capacity: config.session.data_channel_capacity,
        }
    }
}

/// Maximum request body size (64 KiB). Tool calls and session requests are small.
const MAX_REQUEST_BODY_BYTES: usize = 64 * 1024;

/// Health check handler.
async fn health(Extension(state): Extension<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "sessions": state.sessions.len(),
        "livekit": state.voice_service.is_enabled(),
    }))
}

/// Builds the application router with all routes.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/tools", get(api_tools::list_tools_handler))
        .route("/api/sessions", post(api_sessions::create_session_handler))
        .route(
            "/api/sessions/{sessionId}",
            get(api_sessions::get_session_handler).delete(api_sessions::delete_session_handler),
        )
        .route(
            "/api/sessions/{sessionId}/tools",
            post(api_tools::call_tool_handler),
        )
        .route(
            "/api/sessions/{sessionId}/tools/batch",
            post(api_tools::call_tool_batch_handler),
        )
        .route(
            "/events/{sessionId}",
            get(api_sse::get_state_stream_handler),
        )
        .route("/ws", get(api_ws::ws_handler))
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(Extension(Arc::new(state)))
}
