//! Session lifecycle handlers.

use crate::api::{session_not_found, ApiError};
use crate::session::SessionHandle;
use crate::AppState;
use axum::{
    body::Bytes,
    extract::{Extension, Json, Path},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use formcall_types::FormState;
use formcall_voice::AgentConfig;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Optional request body for `POST /api/sessions`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    /// Identity the caller will join the room under.
    pub participant_identity: Option<String>,
    /// Display name for the caller.
    pub participant_name: Option<String>,
}

/// Response body for a newly created session.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionResponse {
    pub session_id: String,
    pub room_name: String,
    pub participant_identity: String,
    /// LiveKit join token for the caller; absent when LiveKit is not configured.
    pub token: Option<String>,
    pub url: String,
    pub greeting: String,
    pub agent: AgentConfig,
    pub state: FormState,
    pub created_at: DateTime<Utc>,
}

/// Response body for `GET /api/sessions/{sessionId}`.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStateResponse {
    pub session_id: String,
    pub room_name: String,
    pub state: FormState,
    pub created_at: DateTime<Utc>,
}

/// Handler for `POST /api/sessions`.
///
/// Creates the form state and data channel, joins the agent, and (when
/// LiveKit is configured) creates the LiveKit room and a caller join token.
pub async fn create_session_handler(
    Extension(state): Extension<Arc<AppState>>,
    body: Bytes,
) -> Result<(StatusCode, Json<CreateSessionResponse>), ApiError> {
    let request: CreateSessionRequest = if body.is_empty() {
        CreateSessionRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| ApiError::BadRequest(format!("invalid session request: {}", e)))?
    };

    let session_id = Uuid::new_v4().to_string();
    let room_name = format!("form-{}", session_id);
    let participant_identity = request
        .participant_identity
        .filter(|p| !p.trim().is_empty())
        .unwrap_or_else(|| format!("caller-{}", &session_id[..8]));
    let participant_name = request
        .participant_name
        .unwrap_or_else(|| participant_identity.clone());

    let voice = &state.voice_service;
    if participant_identity == voice.agent_identity() {
        return Err(ApiError::Conflict(
            "participant identity is reserved for the agent".to_string(),
        ));
    }

    let (token, agent_token) = if voice.is_enabled() {
        voice.create_room(&room_name).await.map_err(|e| {
            tracing::error!(room = %room_name, "failed to create LiveKit room: {}", e);
            ApiError::Upstream(e.to_string())
        })?;
        let token = voice
            .generate_join_token(&room_name, &participant_identity, &participant_name)
            .map_err(|e| ApiError::InternalServerError(e.to_string()))?;
        let agent_token = voice
            .generate_agent_token(&room_name)
            .map_err(|e| ApiError::InternalServerError(e.to_string()))?;
        (Some(token), agent_token)
    } else {
        (None, String::new())
    };

    let handle = SessionHandle::start(
        session_id.clone(),
        room_name.clone(),
        voice.get_url(),
        &agent_token,
        voice.agent_identity(),
        state.data_channel_capacity,
    )
    .map_err(|e| ApiError::InternalServerError(e.to_string()))?;
    let handle = state.sessions.insert(handle);

    tracing::info!(
        session_id = %session_id,
        participant = %participant_identity,
        livekit = token.is_some(),
        "session created"
    );

    Ok((
        StatusCode::CREATED,
        Json(CreateSessionResponse {
            session_id,
            room_name,
            participant_identity,
            token,
            url: voice.get_url().to_string(),
            greeting: state.agent_config.greeting.clone(),
            agent: state.agent_config.as_ref().clone(),
            state: handle.form.snapshot(),
            created_at: handle.created_at,
        }),
    ))
}

/// Handler for `GET /api/sessions/{sessionId}`.
pub async fn get_session_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<Json<SessionStateResponse>, ApiError> {
    let handle = state
        .sessions
        .get(&session_id)
        .ok_or_else(|| session_not_found(&session_id))?;

    Ok(Json(SessionStateResponse {
        session_id: handle.id.clone(),
        room_name: handle.room_name.clone(),
        state: handle.form.snapshot(),
        created_at: handle.created_at,
    }))
}

/// Handler for `DELETE /api/sessions/{sessionId}`.
///
/// The LiveKit room is deleted on a best-effort basis.
pub async fn delete_session_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let handle = state
        .sessions
        .remove(&session_id)
        .ok_or_else(|| session_not_found(&session_id))?;

    if state.voice_service.is_enabled() {
        if let Err(e) = state.voice_service.delete_room(&handle.room_name).await {
            tracing::warn!(room = %handle.room_name, "failed to delete LiveKit room: {}", e);
        }
    }

    Ok(StatusCode::NO_CONTENT)
}
