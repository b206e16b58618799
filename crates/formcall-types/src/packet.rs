//! Data-channel packet types.
//!
//! A [`DataPacket`] is an opaque byte payload published into a session's
//! room by one participant. The agent publishes JSON [`crate::FormState`]
//! snapshots; the frontend publishes JSON [`FieldUpdate`]s.

use serde::{Deserialize, Serialize};

/// Delivery mode requested for a published packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reliability {
    /// Ordered, retransmitted delivery.
    Reliable,
    /// Best-effort delivery: may be dropped, never retransmitted.
    #[default]
    Lossy,
}

/// A payload published on a room's data channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPacket {
    /// Identity of the participant that published the packet.
    pub participant_identity: String,
    /// Raw payload bytes. Usually UTF-8 JSON, but never assumed to be.
    pub payload: Vec<u8>,
    pub reliability: Reliability,
}

impl DataPacket {
    pub fn new(
        participant_identity: impl Into<String>,
        payload: Vec<u8>,
        reliability: Reliability,
    ) -> Self {
        Self {
            participant_identity: participant_identity.into(),
            payload,
            reliability,
        }
    }
}

/// A field edit pushed by a remote peer.
///
/// `field` is kept as a raw string so an unrecognized selector can be
/// reported distinctly from a payload that failed to decode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldUpdate {
    pub field: String,
    pub value: String,
}
