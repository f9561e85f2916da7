//! Media-room SDK seam
//!
//! Signaling, media negotiation and track lifecycle belong to the SDK. This
//! module describes the small surface the bootstrapper needs from it:
//!
//! - [`RoomConnector`] opens sessions and acquires the local camera
//! - [`RoomSession`] exposes participants, publishing, event registration
//!   and disconnect
//! - [`RoomTrack`] creates and releases rendering elements
//! - [`RoomEventHandler`] receives subscription notifications
//!
//! Event handlers are plain synchronous callbacks: the SDK invokes them on
//! its own event loop and each one runs to completion.

use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::config::{ConnectOptions, LocalVideoOptions};
use crate::error::SdkError;
use crate::types::{MediaElement, ParticipantIdentity, TrackKind, TrackSid};

/// Handle to a track owned by the SDK
pub trait RoomTrack: Send + Sync + fmt::Debug {
    fn sid(&self) -> TrackSid;

    fn kind(&self) -> TrackKind;

    /// Create a new rendering element bound to this track
    fn attach(&self) -> MediaElement;

    /// Unbind every element this track rendered into, returning them
    fn detach(&self) -> Vec<MediaElement>;
}

/// Availability and subscription state of a published track
#[derive(Debug, Clone)]
pub struct TrackPublication {
    pub sid: TrackSid,
    pub kind: TrackKind,
    /// Present once the track has been received
    pub track: Option<Arc<dyn RoomTrack>>,
    pub is_subscribed: bool,
}

impl TrackPublication {
    /// The track, when it is subscribed and of video kind
    pub fn subscribed_video(&self) -> Option<&Arc<dyn RoomTrack>> {
        match &self.track {
            Some(track) if self.is_subscribed && track.kind() == TrackKind::Video => Some(track),
            _ => None,
        }
    }
}

/// A remote participant and its publications
#[derive(Debug, Clone)]
pub struct RemoteParticipant {
    pub identity: ParticipantIdentity,
    pub publications: HashMap<TrackSid, TrackPublication>,
}

impl RemoteParticipant {
    pub fn new(identity: ParticipantIdentity) -> Self {
        Self {
            identity,
            publications: HashMap::new(),
        }
    }
}

/// Identifier of a registered event handler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(pub u64);

/// Receiver of track subscription notifications
pub trait RoomEventHandler: Send + Sync {
    fn on_track_subscribed(
        &self,
        track: Arc<dyn RoomTrack>,
        publication: &TrackPublication,
        participant: &ParticipantIdentity,
    );

    fn on_track_unsubscribed(
        &self,
        track: Arc<dyn RoomTrack>,
        publication: &TrackPublication,
        participant: &ParticipantIdentity,
    );
}

/// An open session against a media room
#[async_trait]
pub trait RoomSession: Send + Sync {
    /// Room name as reported by the server
    fn name(&self) -> String;

    /// Register a handler for the life of the session
    fn subscribe(&self, handler: Arc<dyn RoomEventHandler>) -> HandlerId;

    /// Remove a handler; false when it was not registered
    fn unsubscribe(&self, id: HandlerId) -> bool;

    /// Snapshot of the remote participants currently in the room
    fn participants(&self) -> HashMap<ParticipantIdentity, RemoteParticipant>;

    /// Publish a local track through the local participant
    async fn publish_track(&self, track: Arc<dyn RoomTrack>) -> Result<TrackPublication, SdkError>;

    async fn disconnect(&self) -> Result<(), SdkError>;
}

/// Entry point into the SDK
#[async_trait]
pub trait RoomConnector: Send + Sync {
    async fn connect(
        &self,
        url: &str,
        credential: &str,
        options: ConnectOptions,
    ) -> Result<Arc<dyn RoomSession>, SdkError>;

    /// Open a local camera track
    async fn create_local_video_track(
        &self,
        options: LocalVideoOptions,
    ) -> Result<Arc<dyn RoomTrack>, SdkError>;
}
