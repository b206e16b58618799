use formcall_voice::{AgentConfig, LiveKitConfig, VoiceError, VoiceService};
use std::env;

const DEFAULT_URL: &str = "http://localhost:7880";
const DEFAULT_KEY: &str = "devkey";
const DEFAULT_SECRET: &str = "secret";

#[derive(serde::Deserialize)]
struct Claims {
    sub: String,
    name: String,
    video: VideoClaims,
}

#[derive(serde::Deserialize)]
struct VideoClaims {
    #[serde(rename = "canPublish")]
    can_publish: bool,
    #[serde(rename = "canSubscribe")]
    can_subscribe: bool,
    #[serde(rename = "canPublishData")]
    can_publish_data: bool,
    #[serde(rename = "roomJoin")]
    room_join: bool,
    room: String,
}

fn decode_claims(token: &str) -> Claims {
    use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};

    let validation = Validation::new(Algorithm::HS256);
    let key = DecodingKey::from_secret(DEFAULT_SECRET.as_bytes());
    decode::<Claims>(token, &key, &validation)
        .expect("Failed to decode token")
        .claims
}

#[tokio::test]
async fn test_generate_join_token() {
    let config = LiveKitConfig::new(DEFAULT_URL, DEFAULT_KEY, DEFAULT_SECRET);
    let service = VoiceService::new(config);

    let token = service
        .generate_join_token("form-room", "caller-123", "Caller")
        .expect("Failed to generate token");

    assert!(!token.is_empty());
}

#[tokio::test]
async fn test_join_token_allows_data_publishing() {
    let config = LiveKitConfig::new(DEFAULT_URL, DEFAULT_KEY, DEFAULT_SECRET);
    let service = VoiceService::new(config);

    let token = service
        .generate_join_token("perm-room", "caller-perm", "Perm Caller")
        .expect("Failed to generate token");
    let claims = decode_claims(&token);

    assert_eq!(claims.sub, "caller-perm");
    assert_eq!(claims.name, "Perm Caller");
    assert_eq!(claims.video.room, "perm-room");
    assert!(claims.video.room_join, "roomJoin should be true");
    assert!(claims.video.can_publish, "canPublish should be true");
    assert!(claims.video.can_subscribe, "canSubscribe should be true");
    assert!(
        claims.video.can_publish_data,
        "the web form pushes edits over the data channel"
    );
}

#[tokio::test]
async fn test_agent_token_uses_agent_identity() {
    let mut config = LiveKitConfig::new(DEFAULT_URL, DEFAULT_KEY, DEFAULT_SECRET);
    config.agent_identity = "ice-cream-agent".to_string();
    let service = VoiceService::new(config);

    let token = service
        .generate_agent_token("party-room")
        .expect("Failed to generate agent token");
    let claims = decode_claims(&token);

    assert_eq!(claims.sub, "ice-cream-agent");
    assert_eq!(claims.video.room, "party-room");
    assert!(claims.video.can_publish_data);
}

#[test]
fn test_token_requires_credentials() {
    let service = VoiceService::new(LiveKitConfig::default());
    assert!(!service.is_enabled());
    assert!(matches!(
        service.generate_join_token("room", "caller", "Caller"),
        Err(VoiceError::Config(_))
    ));
}

#[tokio::test]
async fn test_create_room() {
    // Only meaningful against a running LiveKit server.
    let url = env::var("LIVEKIT_URL").unwrap_or_else(|_| DEFAULT_URL.to_string());

    let config = LiveKitConfig::new(&url, DEFAULT_KEY, DEFAULT_SECRET);
    let service = VoiceService::new(config);

    match service.create_room("test-integration-room").await {
        Ok(room) => {
            assert_eq!(room.name, "test-integration-room");
            let _ = service.delete_room("test-integration-room").await;
        }
        Err(e) => {
            // No sidecar in this environment; the error must still be typed.
            assert!(matches!(e, VoiceError::RoomService(_)));
            println!("Skipping room creation test: {}", e);
        }
    }
}

#[test]
fn test_livekit_config_toml_defaults() {
    let toml_str = r#"
        url = "ws://localhost:7880"
        api_key = "key"
        api_secret = "secret"
    "#;

    let config: LiveKitConfig = toml::from_str(toml_str).expect("parse TOML");
    assert_eq!(config.token_ttl_seconds, 3600);
    assert_eq!(config.agent_identity, "form-filler-agent");
}

#[test]
fn test_livekit_config_debug_redacts_secret() {
    let config = LiveKitConfig::new(DEFAULT_URL, DEFAULT_KEY, "super-secret-value");
    let debug = format!("{:?}", config);
    assert!(debug.contains("[REDACTED]"));
    assert!(!debug.contains("super-secret-value"));

    let json = serde_json::to_value(&config).expect("serialize");
    assert!(json.get("api_secret").is_none());
}

#[test]
fn test_agent_config_defaults() {
    let config = AgentConfig::default();
    assert!(config.instructions.contains("ice cream party"));
    assert_eq!(
        config.greeting,
        "Hello! I'm here to help you sign up for the ice cream party. What's your name?"
    );
    assert_eq!(config.llm_model, "gpt-4.1");
    assert_eq!(config.stt_model, "nova-3");
    assert_eq!(config.stt_language, "multi");
    assert_eq!(config.tts_voice, "ash");
    assert_eq!(config.vad, "silero");
    assert_eq!(config.max_tool_steps, 5);
}

#[test]
fn test_agent_config_partial_toml() {
    let config: AgentConfig = toml::from_str(
        r#"
        greeting = "Hi there!"
        max_tool_steps = 3
    "#,
    )
    .expect("parse TOML");
    assert_eq!(config.greeting, "Hi there!");
    assert_eq!(config.max_tool_steps, 3);
    assert_eq!(config.llm_model, "gpt-4.1");
}
