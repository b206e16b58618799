use crate::error::VoiceError;
use crate::room::{DataChannel, DataReceiver};
use formcall_form::{PublishError, StatePublisher};
use formcall_types::{DataPacket, Reliability};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::info;

/// The agent's participant handle in a session room.
///
/// Audio (speech in, synthesized speech out) flows through the hosted
/// LiveKit room and the external agent runtime; this handle carries the
/// room's data channel, which is where form state is exchanged with the
/// frontend.
#[derive(Debug)]
pub struct AgentRoomClient {
    pub room_url: String,
    pub token: String,
    pub room_name: String,
    identity: String,
    connected: AtomicBool,
    channel: DataChannel,
}

impl AgentRoomClient {
    /// Joins the room behind `channel` as `identity`.
    pub fn connect(
        url: &str,
        token: &str,
        identity: &str,
        channel: DataChannel,
    ) -> Result<Self, VoiceError> {
        if identity.is_empty() {
            return Err(VoiceError::Config(
                "agent identity must not be empty".to_string(),
            ));
        }

        info!(
            "Agent '{}' connecting to room '{}' at '{}' with token length {}",
            identity,
            channel.room_name(),
            url,
            token.len()
        );

        Ok(Self {
            room_url: url.to_string(),
            token: token.to_string(),
            room_name: channel.room_name().to_string(),
            identity: identity.to_string(),
            connected: AtomicBool::new(true),
            channel,
        })
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    /// Publishes a payload on the room's data channel.
    ///
    /// Never waits for delivery; returns once the packet is queued for the
    /// current participants.
    pub fn publish_data(
        &self,
        payload: Vec<u8>,
        reliability: Reliability,
    ) -> Result<usize, VoiceError> {
        if !self.is_connected() {
            return Err(VoiceError::NotConnected(self.room_name.clone()));
        }

        let packet = DataPacket::new(self.identity.clone(), payload, reliability);
        Ok(self.channel.publish(packet))
    }

    /// Subscribes to data published by the other participants.
    pub fn data_received(&self) -> DataReceiver {
        self.channel.join(self.identity.clone())
    }

    pub fn disconnect(&self) {
        if self.connected.swap(false, Ordering::AcqRel) {
            info!(
                "Agent '{}' disconnecting from room '{}'",
                self.identity, self.room_name
            );
        }
    }
}

impl StatePublisher for AgentRoomClient {
    fn publish_data(
        &self,
        payload: Vec<u8>,
        reliability: Reliability,
    ) -> Result<(), PublishError> {
        AgentRoomClient::publish_data(self, payload, reliability)
            .map(|_| ())
            .map_err(|e| match e {
                VoiceError::NotConnected(_) => PublishError::NotConnected,
                other => PublishError::Transport(other.to_string()),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use formcall_form::FormSession;
    use std::sync::Arc;

    #[tokio::test]
    async fn agent_snapshots_reach_other_participants() {
        let channel = DataChannel::new("form-room", 16);
        let agent = Arc::new(
            AgentRoomClient::connect("ws://localhost:7880", "token", "agent", channel.clone())
                .unwrap(),
        );
        let mut frontend = channel.join("frontend");

        let session = FormSession::new("s1", agent.clone());
        session.set_name("Ada");

        let packet = frontend.recv().await.unwrap();
        assert_eq!(packet.participant_identity, "agent");
        assert_eq!(packet.reliability, Reliability::Lossy);
        let message: serde_json::Value = serde_json::from_slice(&packet.payload).unwrap();
        assert_eq!(message["customer_name"], "Ada");
    }

    #[tokio::test]
    async fn disconnected_agent_refuses_to_publish() {
        let channel = DataChannel::new("form-room", 16);
        let agent =
            AgentRoomClient::connect("ws://localhost:7880", "token", "agent", channel).unwrap();
        agent.disconnect();
        assert!(!agent.is_connected());
        assert!(matches!(
            agent.publish_data(b"{}".to_vec(), Reliability::Lossy),
            Err(VoiceError::NotConnected(_))
        ));
        assert!(matches!(
            StatePublisher::publish_data(&agent, b"{}".to_vec(), Reliability::Lossy),
            Err(PublishError::NotConnected)
        ));
    }

    #[test]
    fn empty_identity_is_rejected() {
        let channel = DataChannel::new("form-room", 16);
        assert!(matches!(
            AgentRoomClient::connect("ws://localhost:7880", "token", "", channel),
            Err(VoiceError::Config(_))
        ));
    }
}
