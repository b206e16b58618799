//! WebSocket bridge between a browser participant and a session's data channel.

use crate::api::{session_not_found, ApiError};
use crate::session::SessionHandle;
use crate::AppState;
use axum::{
    extract::{
        ws::{Message as AxumMessage, WebSocket},
        Extension, Query, WebSocketUpgrade,
    },
    response::{IntoResponse, Response},
};
use formcall_types::{DataPacket, Reliability};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

/// Query parameters for `GET /ws`.
#[derive(Debug, Deserialize)]
pub struct WsConnectParams {
    /// Session to join.
    pub session: String,
    /// Participant identity; a random `web-` identity is assigned if absent.
    pub identity: Option<String>,
}

/// WebSocket handler: `GET /ws?session=...&identity=...`.
///
/// Joins the session's data channel as `identity`. The client first receives
/// the current state snapshot, then every packet published by the other
/// participants as a text frame. Frames sent by the client are published to
/// the room as reliable data packets.
pub async fn ws_handler(
    Extension(state): Extension<Arc<AppState>>,
    ws: WebSocketUpgrade,
    Query(params): Query<WsConnectParams>,
) -> Response {
    let Some(handle) = state.sessions.get(&params.session) else {
        tracing::warn!(session_id = %params.session, "websocket connect for unknown session");
        return session_not_found(&params.session).into_response();
    };

    let identity = params
        .identity
        .filter(|i| !i.trim().is_empty())
        .unwrap_or_else(|| format!("web-{}", &Uuid::new_v4().simple().to_string()[..8]));

    if identity == handle.agent.identity() {
        tracing::warn!(
            session_id = %handle.id,
            identity = %identity,
            "websocket connect with the agent's identity refused"
        );
        return ApiError::Conflict("identity is reserved for the agent".to_string())
            .into_response();
    }

    tracing::info!(session_id = %handle.id, identity = %identity, "websocket participant joined");
    ws.on_upgrade(move |socket| handle_socket(socket, handle, identity))
}

/// Handles the WebSocket connection until the client leaves or the session
/// is closed.
async fn handle_socket(socket: WebSocket, handle: Arc<SessionHandle>, identity: String) {
    let (mut sender, mut receiver) = socket.split();

    // Join before reading the snapshot so no later broadcast is missed.
    let mut inbound = handle.channel.join(identity.clone());
    let snapshot = handle.form.snapshot();
    let mut send_closed = handle.closed();

    let session_id = handle.id.clone();
    let send_task = tokio::spawn(async move {
        match serde_json::to_string(&snapshot) {
            Ok(initial) => {
                if sender.send(AxumMessage::Text(initial.into())).await.is_err() {
                    return;
                }
            }
            Err(e) => {
                tracing::error!(session_id = %session_id, "failed to serialize snapshot: {}", e);
            }
        }

        loop {
            let packet = tokio::select! {
                packet = inbound.recv() => packet,
                () = send_closed.wait() => None,
            };
            let Some(packet) = packet else { break };
            if sender.send(frame_for(packet.payload)).await.is_err() {
                return;
            }
        }

        let _ = sender.send(AxumMessage::Close(None)).await;
    });

    let mut closed = handle.closed();
    loop {
        let msg = tokio::select! {
            msg = receiver.next() => msg,
            () = closed.wait() => break,
        };
        let Some(Ok(msg)) = msg else { break };
        let payload = match msg {
            AxumMessage::Text(text) => text.as_str().as_bytes().to_vec(),
            AxumMessage::Binary(bytes) => bytes.to_vec(),
            AxumMessage::Close(_) => break,
            _ => continue,
        };

        let delivered = handle.channel.publish(DataPacket::new(
            identity.clone(),
            payload,
            Reliability::Reliable,
        ));
        tracing::debug!(
            session_id = %handle.id,
            identity = %identity,
            delivered,
            "published participant data"
        );
    }

    if handle.is_closed() {
        // Let the sender deliver the close frame.
        let _ = send_task.await;
    } else {
        send_task.abort();
    }
    tracing::info!(session_id = %handle.id, identity = %identity, "websocket participant left");
}

/// UTF-8 payloads go out as text frames, anything else as binary.
fn frame_for(payload: Vec<u8>) -> AxumMessage {
    match String::from_utf8(payload) {
        Ok(text) => AxumMessage::Text(text.into()),
        Err(e) => AxumMessage::Binary(e.into_bytes().into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_frames_keep_bytes_intact() {
        assert!(matches!(
            frame_for(br#"{"customer_name":null}"#.to_vec()),
            AxumMessage::Text(text) if text.as_str() == r#"{"customer_name":null}"#
        ));
        assert!(matches!(
            frame_for(vec![0xff, 0x00, 0xfe]),
            AxumMessage::Binary(bytes) if bytes.as_ref() == [0xff, 0x00, 0xfe]
        ));
    }
}
