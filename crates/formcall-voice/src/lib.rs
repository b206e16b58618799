//! Voice room integration for the form-filling agent.
//!
//! Integrates with LiveKit for room management and join tokens, and
//! provides the agent's side of a session room: its participant handle and
//! the room's data channel, over which form snapshots go out to the
//! frontend and field edits come back in.
//!
//! Speech recognition, synthesis and language-model reasoning run in the
//! hosted agent pipeline; [`AgentConfig`] only names the models it uses.

pub mod agent;
pub mod config;
pub mod error;
pub mod room;
pub mod service;

pub use agent::AgentRoomClient;
pub use config::{AgentConfig, LiveKitConfig};
pub use error::VoiceError;
pub use room::{DataChannel, DataReceiver, DEFAULT_DATA_CHANNEL_CAPACITY};
pub use service::VoiceService;
