//! Event system for the room client

use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;

use crate::types::{ParticipantIdentity, TrackSid};

/// Events emitted by a room handle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomClientEvent {
    /// Session opened
    Joined {
        /// Room name reported by the server
        room: String,
        /// URL the session connected to
        url: String,
    },

    /// A track was mounted on the render surface
    TrackAttached {
        track_sid: TrackSid,
        /// Publishing participant, None for the local preview
        participant: Option<ParticipantIdentity>,
    },

    /// A track's elements were removed from the render surface
    TrackDetached {
        track_sid: TrackSid,
        elements_removed: usize,
    },

    /// The local camera was published
    LocalVideoPublished { track_sid: TrackSid },

    /// Non-fatal problem, e.g. a failed session close
    Warning { message: String },

    /// Session closed
    Disconnected,
}

/// Event stream type
pub type EventStream = BroadcastStream<RoomClientEvent>;

/// Event emitter for the room client
#[derive(Clone)]
pub struct EventEmitter {
    sender: broadcast::Sender<RoomClientEvent>,
}

impl EventEmitter {
    /// Create a new event emitter with the specified capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Emit an event
    pub fn emit(&self, event: RoomClientEvent) {
        // No receivers is fine
        let _ = self.sender.send(event);
    }

    /// Subscribe to events as a stream
    pub fn subscribe(&self) -> EventStream {
        BroadcastStream::new(self.sender.subscribe())
    }

    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventEmitter {
    fn default() -> Self {
        Self::new(256)
    }
}
