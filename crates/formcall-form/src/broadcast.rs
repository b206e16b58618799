//! State broadcasting.
//!
//! Every mutation of a session's form publishes the complete
//! [`FormState`] snapshot, never a diff, so a subscriber that missed a
//! packet converges on the next change.

use crate::error::{FormError, PublishError};
use formcall_types::{FormState, Reliability};
use std::sync::Arc;

/// The outbound side of a session's data channel.
///
/// Implementations must not block: a publish either hands the payload to
/// the transport immediately or fails.
pub trait StatePublisher: Send + Sync {
    fn publish_data(&self, payload: Vec<u8>, reliability: Reliability)
        -> Result<(), PublishError>;
}

/// Serializes form snapshots and publishes them lossily.
#[derive(Clone)]
pub struct Broadcaster {
    publisher: Arc<dyn StatePublisher>,
}

impl std::fmt::Debug for Broadcaster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Broadcaster").finish_non_exhaustive()
    }
}

impl Broadcaster {
    pub fn new(publisher: Arc<dyn StatePublisher>) -> Self {
        Self { publisher }
    }

    /// Encodes a snapshot as the UTF-8 JSON broadcast message.
    pub fn encode(state: &FormState) -> Result<Vec<u8>, FormError> {
        serde_json::to_vec(state).map_err(|e| FormError::Snapshot(e.to_string()))
    }

    /// Publishes `state` to every subscriber of the session's channel.
    ///
    /// Fire-and-forget: failures are logged and reported as `false`, never
    /// propagated to the mutation that triggered the broadcast.
    pub fn broadcast(&self, session_id: &str, state: &FormState) -> bool {
        let payload = match Self::encode(state) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!(session_id, "dropping broadcast: {}", e);
                return false;
            }
        };

        let len = payload.len();
        match self.publisher.publish_data(payload, Reliability::Lossy) {
            Ok(()) => {
                tracing::debug!(
                    session_id,
                    bytes = len,
                    submitted = state.submitted,
                    "broadcast form state"
                );
                true
            }
            Err(e) => {
                tracing::warn!(session_id, "form state broadcast failed: {}", e);
                false
            }
        }
    }
}
