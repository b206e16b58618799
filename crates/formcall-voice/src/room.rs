//! Per-room data channel.
//!
//! Every participant of a session room (the agent, the caller's web form,
//! dashboards) publishes and receives [`DataPacket`]s here. Delivery is
//! best-effort: each receiver has a bounded backlog, and a receiver that
//! falls behind skips the oldest packets rather than slowing publishers
//! down.

use formcall_types::DataPacket;
use tokio::sync::broadcast;

/// Default number of packets buffered per receiver.
pub const DEFAULT_DATA_CHANNEL_CAPACITY: usize = 256;

/// The shared publish/subscribe channel of one room.
#[derive(Debug, Clone)]
pub struct DataChannel {
    room_name: String,
    tx: broadcast::Sender<DataPacket>,
}

impl DataChannel {
    pub fn new(room_name: impl Into<String>, capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self {
            room_name: room_name.into(),
            tx,
        }
    }

    pub fn room_name(&self) -> &str {
        &self.room_name
    }

    /// Publishes `packet` to everyone currently in the room.
    ///
    /// Returns the number of receivers the packet was queued for. A room
    /// with nobody listening is not an error; the packet is simply dropped.
    pub fn publish(&self, packet: DataPacket) -> usize {
        self.tx.send(packet).unwrap_or(0)
    }

    /// Joins the room as `identity`. The receiver never yields packets
    /// published under the same identity.
    pub fn join(&self, identity: impl Into<String>) -> DataReceiver {
        DataReceiver {
            identity: identity.into(),
            room_name: self.room_name.clone(),
            rx: self.tx.subscribe(),
        }
    }

    /// Number of participants currently receiving.
    pub fn participant_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

/// One participant's view of a [`DataChannel`].
#[derive(Debug)]
pub struct DataReceiver {
    identity: String,
    room_name: String,
    rx: broadcast::Receiver<DataPacket>,
}

impl DataReceiver {
    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// Waits for the next packet from another participant.
    ///
    /// Returns `None` once every publisher handle of the room is gone.
    pub async fn recv(&mut self) -> Option<DataPacket> {
        loop {
            match self.rx.recv().await {
                Ok(packet) if packet.participant_identity == self.identity => continue,
                Ok(packet) => return Some(packet),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(
                        room = %self.room_name,
                        participant = %self.identity,
                        skipped,
                        "data channel receiver lagged; packets were dropped"
                    );
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}
