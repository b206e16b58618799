//! Tool surface handlers.
//!
//! The external reasoning component registers the definitions from
//! `GET /api/tools` and routes the model's function calls back here.

use crate::api::{session_not_found, ApiError};
use crate::AppState;
use axum::extract::{Extension, Json, Path};
use formcall_form::{dispatch, dispatch_turn, tool_definitions, ToolCall, ToolDefinition, ToolTurn};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Response body for a single tool call.
#[derive(Debug, Serialize, Deserialize)]
pub struct ToolCallResponse {
    pub name: String,
    pub output: String,
}

/// Request body for a turn of tool calls.
#[derive(Debug, Deserialize)]
pub struct ToolBatchRequest {
    pub calls: Vec<ToolCall>,
}

/// Handler for `GET /api/tools`.
pub async fn list_tools_handler() -> Json<Vec<ToolDefinition>> {
    Json(tool_definitions())
}

/// Handler for `POST /api/sessions/{sessionId}/tools`.
pub async fn call_tool_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(session_id): Path<String>,
    Json(call): Json<ToolCall>,
) -> Result<Json<ToolCallResponse>, ApiError> {
    let handle = state
        .sessions
        .get(&session_id)
        .ok_or_else(|| session_not_found(&session_id))?;

    let output = dispatch(&handle.form, &call).map_err(|e| {
        tracing::warn!(session_id = %session_id, tool = %call.name, "tool call rejected: {}", e);
        ApiError::from(e)
    })?;

    Ok(Json(ToolCallResponse {
        name: call.name,
        output,
    }))
}

/// Handler for `POST /api/sessions/{sessionId}/tools/batch`.
///
/// Runs the calls in order, up to the configured step limit.
pub async fn call_tool_batch_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(session_id): Path<String>,
    Json(request): Json<ToolBatchRequest>,
) -> Result<Json<ToolTurn>, ApiError> {
    let handle = state
        .sessions
        .get(&session_id)
        .ok_or_else(|| session_not_found(&session_id))?;

    Ok(Json(dispatch_turn(
        &handle.form,
        &request.calls,
        state.agent_config.max_tool_steps,
    )))
}
