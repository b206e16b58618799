//! SSE state stream handlers.

use crate::api::{session_not_found, ApiError};
use crate::AppState;
use axum::{
    extract::{Extension, Path},
    response::{
        sse::{Event, KeepAlive},
        Sse,
    },
};
use futures_util::{stream, Stream, StreamExt};
use std::{convert::Infallible, sync::Arc};
use uuid::Uuid;

/// Handler for `GET /events/{sessionId}`.
///
/// Streams the session's state snapshots: the current one on connect, then
/// every snapshot the agent broadcasts. Edits pushed by other participants
/// are not forwarded; their effect arrives as the next snapshot. The stream
/// ends when the session is closed.
pub async fn get_state_stream_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let handle = state
        .sessions
        .get(&session_id)
        .ok_or_else(|| session_not_found(&session_id))?;

    let observer = format!("observer-{}", Uuid::new_v4().simple());
    let receiver = handle.channel.join(observer);
    let initial = serde_json::to_string(&handle.form.snapshot())
        .map_err(|e| ApiError::InternalServerError(e.to_string()))?;
    let agent_identity = handle.agent.identity().to_string();
    let mut closed = handle.closed();

    let snapshots = stream::unfold(receiver, |mut receiver| async move {
        receiver.recv().await.map(|packet| (packet, receiver))
    })
    .filter_map(move |packet| {
        let from_agent = packet.participant_identity == agent_identity;
        async move {
            if !from_agent {
                return None;
            }
            match String::from_utf8(packet.payload) {
                Ok(data) => Some(Ok::<_, Infallible>(Event::default().data(data))),
                Err(e) => {
                    tracing::error!("state snapshot is not valid UTF-8: {}", e);
                    None
                }
            }
        }
    });

    let events = stream::once(async move { Ok::<_, Infallible>(Event::default().data(initial)) })
        .chain(snapshots)
        .take_until(async move { closed.wait().await });

    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}
