//! In-memory room SDK
//!
//! A self-contained implementation of the SDK and surface seams. It never
//! touches the network: participants, publications and subscription
//! notifications are driven by the caller, which makes it suitable for tests
//! and offline demos.
//!
//! ```rust
//! use std::sync::Arc;
//! use verdant_room_core::memory::{MemoryConnector, MemorySurface, MemoryTrack};
//! use verdant_room_core::{RenderSurface, RoomConfig, TrackKind};
//!
//! # tokio_test::block_on(async {
//! let connector = Arc::new(MemoryConnector::new("lobby"));
//! let surface = Arc::new(MemorySurface::element());
//! let config = RoomConfig::new().with_server_url("ws://localhost:7880");
//!
//! let handle = verdant_room_core::setup_room(
//!     connector.clone(),
//!     config,
//!     "tok-abc",
//!     "lobby",
//!     surface.clone(),
//! )
//! .await
//! .unwrap();
//!
//! connector.room().subscribe_track("alice", MemoryTrack::new("TR_alice_cam", TrackKind::Video));
//! assert_eq!(surface.child_count(), 1);
//!
//! handle.disconnect().await;
//! assert_eq!(surface.child_count(), 0);
//! # });
//! ```

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

use crate::config::{ConnectOptions, LocalVideoOptions};
use crate::error::SdkError;
use crate::sdk::{
    HandlerId, RemoteParticipant, RoomConnector, RoomEventHandler, RoomSession, RoomTrack,
    TrackPublication,
};
use crate::surface::{RenderSurface, SurfaceKind};
use crate::types::{ElementId, MediaElement, ParticipantIdentity, TrackKind, TrackSid};

/// Track that remembers the elements it rendered into
#[derive(Debug)]
pub struct MemoryTrack {
    sid: TrackSid,
    kind: TrackKind,
    bound: Mutex<Vec<MediaElement>>,
}

impl MemoryTrack {
    pub fn new(sid: impl Into<String>, kind: TrackKind) -> Arc<Self> {
        Arc::new(Self {
            sid: TrackSid::new(sid),
            kind,
            bound: Mutex::new(Vec::new()),
        })
    }

    /// Number of elements currently bound to the track
    pub fn bound_count(&self) -> usize {
        self.bound.lock().len()
    }
}

impl RoomTrack for MemoryTrack {
    fn sid(&self) -> TrackSid {
        self.sid.clone()
    }

    fn kind(&self) -> TrackKind {
        self.kind
    }

    fn attach(&self) -> MediaElement {
        let element = MediaElement::new(self.sid.clone(), self.kind);
        self.bound.lock().push(element.clone());
        element
    }

    fn detach(&self) -> Vec<MediaElement> {
        std::mem::take(&mut *self.bound.lock())
    }
}

/// Surface backed by a child list
pub struct MemorySurface {
    kind: SurfaceKind,
    children: Mutex<Vec<MediaElement>>,
    removals: AtomicUsize,
}

impl MemorySurface {
    /// An element node, the only kind that accepts children
    pub fn element() -> Self {
        Self::with_kind(SurfaceKind::Element)
    }

    pub fn with_kind(kind: SurfaceKind) -> Self {
        Self {
            kind,
            children: Mutex::new(Vec::new()),
            removals: AtomicUsize::new(0),
        }
    }

    pub fn children(&self) -> Vec<MediaElement> {
        self.children.lock().clone()
    }

    /// Total successful removals over the surface's lifetime
    pub fn removal_count(&self) -> usize {
        self.removals.load(Ordering::SeqCst)
    }
}

impl RenderSurface for MemorySurface {
    fn kind(&self) -> SurfaceKind {
        self.kind
    }

    fn append_child(&self, element: MediaElement) {
        self.children.lock().push(element);
    }

    fn remove_child(&self, id: ElementId) -> bool {
        let mut children = self.children.lock();
        match children.iter().position(|child| child.id == id) {
            Some(index) => {
                children.remove(index);
                self.removals.fetch_add(1, Ordering::SeqCst);
                true
            }
            None => false,
        }
    }

    fn contains(&self, id: ElementId) -> bool {
        self.children.lock().iter().any(|child| child.id == id)
    }

    fn child_count(&self) -> usize {
        self.children.lock().len()
    }
}

/// Room whose participants and notifications are scripted by the caller
pub struct MemoryRoom {
    name: String,
    handlers: Mutex<HashMap<HandlerId, Arc<dyn RoomEventHandler>>>,
    next_handler: AtomicU64,
    participants: Mutex<HashMap<ParticipantIdentity, RemoteParticipant>>,
    local_publications: Mutex<Vec<TrackPublication>>,
    publish_failure: Mutex<Option<SdkError>>,
    disconnect_failure: Mutex<Option<SdkError>>,
    disconnect_calls: AtomicUsize,
    connected: AtomicBool,
}

impl MemoryRoom {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            handlers: Mutex::new(HashMap::new()),
            next_handler: AtomicU64::new(1),
            participants: Mutex::new(HashMap::new()),
            local_publications: Mutex::new(Vec::new()),
            publish_failure: Mutex::new(None),
            disconnect_failure: Mutex::new(None),
            disconnect_calls: AtomicUsize::new(0),
            connected: AtomicBool::new(false),
        }
    }

    /// Add a publication without notifying handlers, as if it predates the session
    pub fn add_publication(
        &self,
        participant: &str,
        track: Arc<dyn RoomTrack>,
        is_subscribed: bool,
    ) {
        let publication = TrackPublication {
            sid: track.sid(),
            kind: track.kind(),
            track: Some(track),
            is_subscribed,
        };
        self.upsert_publication(participant, publication);
    }

    /// Add a publication whose track has not been received yet
    pub fn add_pending_publication(&self, participant: &str, sid: &str, kind: TrackKind) {
        let publication = TrackPublication {
            sid: TrackSid::new(sid),
            kind,
            track: None,
            is_subscribed: false,
        };
        self.upsert_publication(participant, publication);
    }

    /// Mark a track subscribed and fire TrackSubscribed
    pub fn subscribe_track(&self, participant: &str, track: Arc<dyn RoomTrack>) {
        let identity = ParticipantIdentity::new(participant);
        let publication = TrackPublication {
            sid: track.sid(),
            kind: track.kind(),
            track: Some(track.clone()),
            is_subscribed: true,
        };
        self.upsert_publication(participant, publication.clone());

        for handler in self.handler_snapshot() {
            handler.on_track_subscribed(track.clone(), &publication, &identity);
        }
    }

    /// Mark a track unsubscribed and fire TrackUnsubscribed
    ///
    /// Returns false when the participant has no such subscribed track.
    pub fn unsubscribe_track(&self, participant: &str, sid: &str) -> bool {
        let identity = ParticipantIdentity::new(participant);
        let publication = {
            let mut participants = self.participants.lock();
            let Some(entry) = participants.get_mut(&identity) else {
                return false;
            };
            match entry.publications.get_mut(&TrackSid::new(sid)) {
                Some(publication) if publication.is_subscribed => {
                    publication.is_subscribed = false;
                    publication.clone()
                }
                _ => return false,
            }
        };

        let Some(track) = publication.track.clone() else {
            return false;
        };
        for handler in self.handler_snapshot() {
            handler.on_track_unsubscribed(track.clone(), &publication, &identity);
        }
        true
    }

    /// Make the next publish fail
    pub fn fail_next_publish(&self, error: SdkError) {
        *self.publish_failure.lock() = Some(error);
    }

    /// Make every disconnect fail
    pub fn fail_disconnect(&self, error: SdkError) {
        *self.disconnect_failure.lock() = Some(error);
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.lock().len()
    }

    pub fn disconnect_calls(&self) -> usize {
        self.disconnect_calls.load(Ordering::SeqCst)
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    pub fn local_publications(&self) -> Vec<TrackPublication> {
        self.local_publications.lock().clone()
    }

    fn mark_connected(&self) {
        self.connected.store(true, Ordering::SeqCst);
    }

    fn upsert_publication(&self, participant: &str, publication: TrackPublication) {
        let identity = ParticipantIdentity::new(participant);
        self.participants
            .lock()
            .entry(identity.clone())
            .or_insert_with(|| RemoteParticipant::new(identity))
            .publications
            .insert(publication.sid.clone(), publication);
    }

    fn handler_snapshot(&self) -> Vec<Arc<dyn RoomEventHandler>> {
        self.handlers.lock().values().cloned().collect()
    }
}

#[async_trait]
impl RoomSession for MemoryRoom {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn subscribe(&self, handler: Arc<dyn RoomEventHandler>) -> HandlerId {
        let id = HandlerId(self.next_handler.fetch_add(1, Ordering::SeqCst));
        self.handlers.lock().insert(id, handler);
        id
    }

    fn unsubscribe(&self, id: HandlerId) -> bool {
        self.handlers.lock().remove(&id).is_some()
    }

    fn participants(&self) -> HashMap<ParticipantIdentity, RemoteParticipant> {
        self.participants.lock().clone()
    }

    async fn publish_track(&self, track: Arc<dyn RoomTrack>) -> Result<TrackPublication, SdkError> {
        if !self.is_connected() {
            return Err(SdkError::Closed);
        }
        if let Some(error) = self.publish_failure.lock().take() {
            return Err(error);
        }

        let publication = TrackPublication {
            sid: track.sid(),
            kind: track.kind(),
            track: Some(track),
            is_subscribed: false,
        };
        self.local_publications.lock().push(publication.clone());
        Ok(publication)
    }

    async fn disconnect(&self) -> Result<(), SdkError> {
        self.disconnect_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = self.disconnect_failure.lock().clone() {
            return Err(error);
        }
        self.connected.store(false, Ordering::SeqCst);

        // Leaving the room drops every remote subscription
        let subscribed: Vec<(ParticipantIdentity, TrackPublication)> = self
            .participants
            .lock()
            .drain()
            .flat_map(|(identity, participant)| {
                participant
                    .publications
                    .into_values()
                    .filter(|publication| publication.is_subscribed)
                    .map(move |publication| (identity.clone(), publication))
            })
            .collect();

        let handlers = self.handler_snapshot();
        for (identity, mut publication) in subscribed {
            publication.is_subscribed = false;
            if let Some(track) = publication.track.clone() {
                for handler in &handlers {
                    handler.on_track_unsubscribed(track.clone(), &publication, &identity);
                }
            }
        }
        Ok(())
    }
}

/// Connector handing out a single shared [`MemoryRoom`]
pub struct MemoryConnector {
    room: Arc<MemoryRoom>,
    connect_calls: AtomicUsize,
    last_connect: Mutex<Option<(String, String, ConnectOptions)>>,
    connect_failure: Mutex<Option<SdkError>>,
    camera_failure: Mutex<Option<SdkError>>,
    camera_requests: Mutex<Vec<LocalVideoOptions>>,
    next_local: AtomicU64,
}

impl MemoryConnector {
    pub fn new(room_name: impl Into<String>) -> Self {
        Self::with_room(Arc::new(MemoryRoom::new(room_name)))
    }

    pub fn with_room(room: Arc<MemoryRoom>) -> Self {
        Self {
            room,
            connect_calls: AtomicUsize::new(0),
            last_connect: Mutex::new(None),
            connect_failure: Mutex::new(None),
            camera_failure: Mutex::new(None),
            camera_requests: Mutex::new(Vec::new()),
            next_local: AtomicU64::new(1),
        }
    }

    pub fn room(&self) -> &Arc<MemoryRoom> {
        &self.room
    }

    /// Make every connect fail
    pub fn fail_connect(&self, error: SdkError) {
        *self.connect_failure.lock() = Some(error);
    }

    /// Make every camera acquisition fail
    pub fn fail_camera(&self, error: SdkError) {
        *self.camera_failure.lock() = Some(error);
    }

    pub fn connect_calls(&self) -> usize {
        self.connect_calls.load(Ordering::SeqCst)
    }

    /// URL, credential and options of the most recent connect
    pub fn last_connect(&self) -> Option<(String, String, ConnectOptions)> {
        self.last_connect.lock().clone()
    }

    pub fn camera_requests(&self) -> Vec<LocalVideoOptions> {
        self.camera_requests.lock().clone()
    }
}

#[async_trait]
impl RoomConnector for MemoryConnector {
    async fn connect(
        &self,
        url: &str,
        credential: &str,
        options: ConnectOptions,
    ) -> Result<Arc<dyn RoomSession>, SdkError> {
        self.connect_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_connect.lock() = Some((url.to_string(), credential.to_string(), options));

        if let Some(error) = self.connect_failure.lock().clone() {
            return Err(error);
        }

        self.room.mark_connected();
        Ok(self.room.clone())
    }

    async fn create_local_video_track(
        &self,
        options: LocalVideoOptions,
    ) -> Result<Arc<dyn RoomTrack>, SdkError> {
        self.camera_requests.lock().push(options);
        if let Some(error) = self.camera_failure.lock().clone() {
            return Err(error);
        }

        let n = self.next_local.fetch_add(1, Ordering::SeqCst);
        Ok(MemoryTrack::new(format!("TR_local_camera_{}", n), TrackKind::Video))
    }
}
