use crate::config::LiveKitConfig;
use crate::error::VoiceError;
use livekit_api::access_token::{AccessToken, VideoGrants};
use livekit_api::services::room::{CreateRoomOptions, RoomClient};
use livekit_protocol::Room;
use std::time::Duration;

#[derive(Debug)]
pub struct VoiceService {
    config: LiveKitConfig,
    room_client: RoomClient,
}

impl VoiceService {
    pub fn new(config: LiveKitConfig) -> Self {
        let room_client =
            RoomClient::with_api_key(&config.url, &config.api_key, &config.api_secret);
        Self {
            config,
            room_client,
        }
    }

    pub fn is_enabled(&self) -> bool {
        !self.config.url.is_empty()
    }

    pub fn get_url(&self) -> &str {
        &self.config.url
    }

    /// Identity the agent uses when it joins a room.
    pub fn agent_identity(&self) -> &str {
        &self.config.agent_identity
    }

    pub async fn create_room(&self, name: &str) -> Result<Room, VoiceError> {
        let options = CreateRoomOptions::default();

        self.room_client
            .create_room(name, options)
            .await
            .map_err(|e| VoiceError::RoomService(e.to_string()))
    }

    pub async fn delete_room(&self, name: &str) -> Result<(), VoiceError> {
        self.room_client
            .delete_room(name)
            .await
            .map_err(|e| VoiceError::RoomService(e.to_string()))
    }

    /// Issues a join token for a caller. Callers may publish audio and data
    /// (the frontend form pushes field edits over the data channel).
    pub fn generate_join_token(
        &self,
        room_name: &str,
        participant_identity: &str,
        participant_name: &str,
    ) -> Result<String, VoiceError> {
        self.token(
            room_name,
            participant_identity,
            participant_name,
            VideoGrants {
                room_join: true,
                room: room_name.to_string(),
                can_publish: true,
                can_subscribe: true,
                can_publish_data: true,
                ..Default::default()
            },
        )
    }

    /// Issues the agent's own join token for `room_name`.
    pub fn generate_agent_token(&self, room_name: &str) -> Result<String, VoiceError> {
        let identity = self.config.agent_identity.as_str();
        self.generate_join_token(room_name, identity, identity)
    }

    fn token(
        &self,
        room_name: &str,
        identity: &str,
        name: &str,
        grants: VideoGrants,
    ) -> Result<String, VoiceError> {
        if self.config.api_key.is_empty() || self.config.api_secret.is_empty() {
            return Err(VoiceError::Config(format!(
                "cannot issue a token for room '{}' without LiveKit API credentials",
                room_name
            )));
        }

        let token = AccessToken::with_api_key(&self.config.api_key, &self.config.api_secret)
            .with_identity(identity)
            .with_name(name)
            .with_grants(grants)
            .with_ttl(Duration::from_secs(self.config.token_ttl_seconds));

        token.to_jwt().map_err(VoiceError::LiveKit)
    }
}
