//! Inbound field edits from remote peers.
//!
//! The frontend form publishes `{"field": "name", "value": "Ada"}` packets
//! on the session's data channel. They are applied straight to the store,
//! bypassing the conversational path. Anything that fails to decode is
//! logged and dropped: a bad packet never takes the session down.

use crate::error::FormError;
use crate::store::FormSession;
use formcall_types::{DataPacket, FieldUpdate, FormField};
use std::sync::Arc;

/// Decodes a raw update payload into a recognized field and its value.
pub fn decode_update(payload: &[u8]) -> Result<(FormField, String), FormError> {
    let text = std::str::from_utf8(payload)?;
    let update: FieldUpdate = serde_json::from_str(text)?;
    let field = update
        .field
        .parse::<FormField>()
        .map_err(|e| FormError::UnknownField(e.0))?;
    Ok((field, update.value))
}

/// Applies data-channel packets to a session's form.
#[derive(Debug, Clone)]
pub struct UpdateListener {
    session: Arc<FormSession>,
}

impl UpdateListener {
    pub fn new(session: Arc<FormSession>) -> Self {
        Self { session }
    }

    /// Decodes and applies one packet. The session broadcasts on success.
    pub fn apply(&self, packet: &DataPacket) -> Result<FormField, FormError> {
        let (field, value) = decode_update(&packet.payload)?;
        self.session.apply_update(field, value)?;
        Ok(field)
    }

    /// Handles a received packet, absorbing every failure into the log.
    ///
    /// Returns whether the form was updated.
    pub fn on_data_received(&self, packet: &DataPacket) -> bool {
        let session_id = self.session.session_id();
        let participant = packet.participant_identity.as_str();
        tracing::info!(
            session_id,
            participant,
            bytes = packet.payload.len(),
            "received data"
        );

        match self.apply(packet) {
            Ok(field) => {
                tracing::info!(
                    session_id,
                    participant,
                    field = field.as_str(),
                    "updated {} from data channel",
                    field.label()
                );
                true
            }
            Err(FormError::UnknownField(field)) => {
                tracing::error!(session_id, participant, "unknown field: {}", field);
                false
            }
            Err(e) => {
                tracing::error!(session_id, participant, "failed to parse data packet: {}", e);
                false
            }
        }
    }
}
