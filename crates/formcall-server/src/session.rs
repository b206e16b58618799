//! Live form-filling sessions.
//!
//! A session is one caller's room: the form state, the room's data channel,
//! the agent's participant handle and the task that feeds inbound edits from
//! the data channel into the form.

use chrono::{DateTime, Utc};
use formcall_form::{FormSession, UpdateListener};
use formcall_voice::{AgentRoomClient, DataChannel, VoiceError};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// A running session.
#[derive(Debug)]
pub struct SessionHandle {
    pub id: String,
    pub room_name: String,
    pub created_at: DateTime<Utc>,
    pub form: Arc<FormSession>,
    pub agent: Arc<AgentRoomClient>,
    pub channel: DataChannel,
    listener_task: JoinHandle<()>,
    shutdown: watch::Sender<bool>,
}

impl SessionHandle {
    /// Opens the room's data channel, joins it as the agent and starts
    /// listening for field edits from the other participants.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(
        id: String,
        room_name: String,
        livekit_url: &str,
        agent_token: &str,
        agent_identity: &str,
        capacity: usize,
    ) -> Result<Self, VoiceError> {
        let channel = DataChannel::new(room_name.clone(), capacity);
        let agent = Arc::new(AgentRoomClient::connect(
            livekit_url,
            agent_token,
            agent_identity,
            channel.clone(),
        )?);
        let form = Arc::new(FormSession::new(id.clone(), agent.clone()));

        // Subscribe before spawning so nothing published in between is missed.
        let mut inbound = agent.data_received();
        let listener = UpdateListener::new(form.clone());
        let session_id = id.clone();
        let listener_task = tokio::spawn(async move {
            while let Some(packet) = inbound.recv().await {
                listener.on_data_received(&packet);
            }
            tracing::debug!(session_id = %session_id, "update listener stopped");
        });

        let (shutdown, _) = watch::channel(false);
        tracing::info!(session_id = %id, room = %room_name, "session started");

        Ok(Self {
            id,
            room_name,
            created_at: Utc::now(),
            form,
            agent,
            channel,
            listener_task,
            shutdown,
        })
    }

    /// Ends the session: the agent leaves the room, the listener stops and
    /// every participant connection is told to hang up.
    pub fn close(&self) {
        self.agent.disconnect();
        self.listener_task.abort();
        self.shutdown.send_replace(true);
        tracing::info!(session_id = %self.id, "session closed");
    }

    pub fn is_closed(&self) -> bool {
        *self.shutdown.borrow()
    }

    /// A signal that resolves once the session is closed.
    pub fn closed(&self) -> SessionClosed {
        SessionClosed(self.shutdown.subscribe())
    }
}

/// Close notification for tasks serving a session's participants.
#[derive(Debug, Clone)]
pub struct SessionClosed(watch::Receiver<bool>);

impl SessionClosed {
    /// Waits until the session is closed. Returns immediately if it already is.
    pub async fn wait(&mut self) {
        while !*self.0.borrow_and_update() {
            if self.0.changed().await.is_err() {
                return;
            }
        }
    }
}

/// All live sessions, keyed by session id.
///
/// Uses `std::sync::RwLock`: every acquisition is a brief map operation that
/// never spans an `.await`.
#[derive(Debug, Clone, Default)]
pub struct SessionRegistry {
    sessions: Arc<RwLock<HashMap<String, Arc<SessionHandle>>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, session: SessionHandle) -> Arc<SessionHandle> {
        let session = Arc::new(session);
        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(session.id.clone(), session.clone());
        session
    }

    pub fn get(&self, id: &str) -> Option<Arc<SessionHandle>> {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    /// Removes and closes the session.
    pub fn remove(&self, id: &str) -> Option<Arc<SessionHandle>> {
        let removed = self
            .sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id);
        if let Some(session) = &removed {
            session.close();
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Closes every session. Used on shutdown.
    pub fn close_all(&self) -> usize {
        let drained: Vec<_> = self
            .sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .drain()
            .map(|(_, session)| session)
            .collect();
        for session in &drained {
            session.close();
        }
        drained.len()
    }
}
