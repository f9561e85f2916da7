//! Room session bootstrapping
//!
//! [`RoomSessionBootstrapper`] validates its inputs, opens a session through
//! the SDK, wires subscription notifications to the [`TrackRenderer`] and
//! mounts any video that was already subscribed when the session came up.
//! The resulting [`RoomHandle`] is what callers keep for the life of the
//! session.
//!
//! ```text
//! Unjoined ──setup──▶ Joining ──ok──▶ Joined ──publish──▶ Publishing
//!    ▲                   │               │                    │
//!    └──── join error ───┘               └──── disconnect ────┴──▶ Disconnecting
//!                                                                        │
//!                                                                   Disconnected
//! ```

use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, info, trace, warn};

use crate::config::{LocalVideoOptions, RoomConfig};
use crate::error::{RoomError, RoomResult};
use crate::events::{EventEmitter, EventStream, RoomClientEvent};
use crate::renderer::TrackRenderer;
use crate::sdk::{
    HandlerId, RoomConnector, RoomEventHandler, RoomSession, RoomTrack, TrackPublication,
};
use crate::surface::{RenderSurface, SurfaceKind};
use crate::types::{ParticipantIdentity, SessionState, TrackKind, TrackSid};

/// Joins a room and keeps a render surface in sync with its video tracks
pub struct RoomSessionBootstrapper {
    connector: Arc<dyn RoomConnector>,
    config: RoomConfig,
    emitter: EventEmitter,
    state: Arc<RwLock<SessionState>>,
}

impl RoomSessionBootstrapper {
    pub fn new(connector: Arc<dyn RoomConnector>, config: RoomConfig) -> Self {
        Self {
            connector,
            config,
            emitter: EventEmitter::default(),
            state: Arc::new(RwLock::new(SessionState::Unjoined)),
        }
    }

    pub fn config(&self) -> &RoomConfig {
        &self.config
    }

    pub fn state(&self) -> SessionState {
        *self.state.read()
    }

    /// Subscribe to room events; subscribe before `setup` to see `Joined`
    pub fn events(&self) -> EventStream {
        self.emitter.subscribe()
    }

    /// Validate inputs, join the room and start rendering its video tracks
    ///
    /// Input problems fail with [`RoomError::InvalidArgument`] before any
    /// connection attempt. An empty room name only logs a warning since the
    /// credential may already grant access to a specific room.
    pub async fn setup(
        &self,
        credential: &str,
        room_name: &str,
        surface: Arc<dyn RenderSurface>,
    ) -> RoomResult<RoomHandle> {
        if credential.trim().is_empty() {
            return Err(RoomError::invalid_argument("credential (non-empty string) required"));
        }
        if room_name.is_empty() {
            warn!("Room name is empty; credential may already define room access");
        }
        if surface.kind() != SurfaceKind::Element {
            return Err(RoomError::invalid_argument(format!(
                "render surface must be an element, got {:?}",
                surface.kind()
            )));
        }
        let url = self.config.resolve_server_url()?;

        {
            let mut state = self.state.write();
            if *state != SessionState::Unjoined {
                return Err(RoomError::invalid_state(format!(
                    "bootstrapper already used (state: {})",
                    *state
                )));
            }
            *state = SessionState::Joining;
        }

        info!("Joining room '{}' at {}", room_name, url);
        let session = match self.connector.connect(&url, credential, self.config.connect).await {
            Ok(session) => session,
            Err(e) => {
                *self.state.write() = SessionState::Unjoined;
                return Err(RoomError::join_failure(&url, e));
            }
        };

        let renderer = Arc::new(TrackRenderer::new(surface, self.emitter.clone()));
        let handler_id = session.subscribe(Arc::new(SubscriptionHandler {
            renderer: renderer.clone(),
        }));

        let reconciled = reconcile_subscribed(session.as_ref(), &renderer);
        if reconciled > 0 {
            debug!("Attached {} video tracks already subscribed at join", reconciled);
        }

        *self.state.write() = SessionState::Joined;
        info!(
            "Joined room '{}' ({} tracks on surface)",
            session.name(),
            renderer.attached_track_count()
        );
        self.emitter.emit(RoomClientEvent::Joined {
            room: session.name(),
            url: url.clone(),
        });

        Ok(RoomHandle {
            session,
            connector: self.connector.clone(),
            renderer,
            handler_id,
            state: self.state.clone(),
            emitter: self.emitter.clone(),
            local_video: self.config.local_video_options(),
            url,
        })
    }
}

/// Join a room in one call
pub async fn setup_room(
    connector: Arc<dyn RoomConnector>,
    config: RoomConfig,
    credential: &str,
    room_name: &str,
    surface: Arc<dyn RenderSurface>,
) -> RoomResult<RoomHandle> {
    RoomSessionBootstrapper::new(connector, config)
        .setup(credential, room_name, surface)
        .await
}

/// Mount every subscribed video publication already present in the room
///
/// Covers tracks that arrived between session creation and handler
/// registration. Tracks an event already mounted are skipped.
fn reconcile_subscribed(session: &dyn RoomSession, renderer: &TrackRenderer) -> usize {
    let mut attached = 0;
    for participant in session.participants().values() {
        for publication in participant.publications.values() {
            if let Some(track) = publication.subscribed_video() {
                if renderer.attach(track.clone(), Some(&participant.identity)) {
                    attached += 1;
                }
            }
        }
    }
    attached
}

/// Routes subscription notifications to the renderer; video only
struct SubscriptionHandler {
    renderer: Arc<TrackRenderer>,
}

impl RoomEventHandler for SubscriptionHandler {
    fn on_track_subscribed(
        &self,
        track: Arc<dyn RoomTrack>,
        _publication: &TrackPublication,
        participant: &ParticipantIdentity,
    ) {
        if track.kind() != TrackKind::Video {
            trace!("Not rendering {} track {} from {}", track.kind(), track.sid(), participant);
            return;
        }
        self.renderer.attach(track, Some(participant));
    }

    fn on_track_unsubscribed(
        &self,
        track: Arc<dyn RoomTrack>,
        _publication: &TrackPublication,
        _participant: &ParticipantIdentity,
    ) {
        if track.kind() == TrackKind::Video {
            self.renderer.detach(&track);
        }
    }
}

/// Caller's handle on a joined room
pub struct RoomHandle {
    session: Arc<dyn RoomSession>,
    connector: Arc<dyn RoomConnector>,
    renderer: Arc<TrackRenderer>,
    handler_id: HandlerId,
    state: Arc<RwLock<SessionState>>,
    emitter: EventEmitter,
    local_video: LocalVideoOptions,
    url: String,
}

impl RoomHandle {
    /// The SDK session
    pub fn session(&self) -> &Arc<dyn RoomSession> {
        &self.session
    }

    pub fn state(&self) -> SessionState {
        *self.state.read()
    }

    pub fn server_url(&self) -> &str {
        &self.url
    }

    pub fn events(&self) -> EventStream {
        self.emitter.subscribe()
    }

    /// Number of tracks currently mounted on the surface
    pub fn attached_track_count(&self) -> usize {
        self.renderer.attached_track_count()
    }

    pub fn surface(&self) -> &Arc<dyn RenderSurface> {
        self.renderer.surface()
    }

    /// Open the local camera, publish it and mount its preview
    ///
    /// Device, permission and publish errors come back as
    /// [`RoomError::PublishFailure`]. Not retried.
    pub async fn publish_local_video(&self) -> RoomResult<TrackSid> {
        let state = self.state();
        if !state.is_active() {
            return Err(RoomError::invalid_state(format!(
                "cannot publish local video while {}",
                state
            )));
        }

        let track = self
            .connector
            .create_local_video_track(self.local_video)
            .await
            .map_err(RoomError::publish_failure)?;
        self.session
            .publish_track(track.clone())
            .await
            .map_err(RoomError::publish_failure)?;

        let sid = track.sid();
        {
            // Held across the attach so disconnect cannot clear the surface in between
            let mut state = self.state.write();
            if state.is_closing() {
                return Err(RoomError::invalid_state("session disconnected during publish"));
            }
            *state = SessionState::Publishing;
            self.renderer.attach(track, None);
        }

        info!("Published local video track {}", sid);
        self.emitter.emit(RoomClientEvent::LocalVideoPublished { track_sid: sid.clone() });
        Ok(sid)
    }

    /// Leave the room
    ///
    /// Best effort and idempotent: a failing close is logged and emitted as a
    /// [`RoomClientEvent::Warning`], never returned. Anything still mounted
    /// on the surface is removed afterwards.
    pub async fn disconnect(&self) {
        {
            let mut state = self.state.write();
            if state.is_closing() {
                debug!("Disconnect already {}", *state);
                return;
            }
            *state = SessionState::Disconnecting;
        }

        if let Err(e) = self.session.disconnect().await {
            warn!("Error disconnecting from room: {}", e);
            self.emitter.emit(RoomClientEvent::Warning {
                message: format!("error disconnecting from room: {}", e),
            });
        }

        self.session.unsubscribe(self.handler_id);
        let removed = self.renderer.detach_all();
        if removed > 0 {
            debug!("Removed {} leftover elements after disconnect", removed);
        }

        *self.state.write() = SessionState::Disconnected;
        info!("Disconnected from room '{}'", self.session.name());
        self.emitter.emit(RoomClientEvent::Disconnected);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SdkError;
    use crate::memory::{MemoryConnector, MemorySurface, MemoryTrack};
    use tracing_test::traced_test;

    fn config() -> RoomConfig {
        RoomConfig::new().with_server_url("ws://127.0.0.1:7880")
    }

    #[tokio::test]
    async fn test_state_moves_to_joined() {
        let connector = Arc::new(MemoryConnector::new("lobby"));
        let bootstrapper = RoomSessionBootstrapper::new(connector, config());
        assert_eq!(bootstrapper.state(), SessionState::Unjoined);

        let handle = bootstrapper
            .setup("tok-abc", "lobby", Arc::new(MemorySurface::element()))
            .await
            .unwrap();
        assert_eq!(handle.state(), SessionState::Joined);
        assert_eq!(bootstrapper.state(), SessionState::Joined);
        assert_eq!(handle.server_url(), "ws://127.0.0.1:7880");
    }

    #[tokio::test]
    async fn test_second_setup_is_rejected() {
        let connector = Arc::new(MemoryConnector::new("lobby"));
        let bootstrapper = RoomSessionBootstrapper::new(connector.clone(), config());
        let _handle = bootstrapper
            .setup("tok-abc", "lobby", Arc::new(MemorySurface::element()))
            .await
            .unwrap();

        let err = bootstrapper
            .setup("tok-abc", "lobby", Arc::new(MemorySurface::element()))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, RoomError::InvalidState { .. }));
        assert_eq!(connector.connect_calls(), 1);
    }

    #[tokio::test]
    async fn test_join_failure_returns_to_unjoined() {
        let connector = Arc::new(MemoryConnector::new("lobby"));
        connector.fail_connect(SdkError::Unauthorized("expired".to_string()));
        let bootstrapper = RoomSessionBootstrapper::new(connector, config());

        let err = bootstrapper
            .setup("tok-abc", "lobby", Arc::new(MemorySurface::element()))
            .await
            .err()
            .unwrap();
        assert!(
            matches!(err, RoomError::JoinFailure { ref url, .. } if url == "ws://127.0.0.1:7880")
        );
        assert_eq!(bootstrapper.state(), SessionState::Unjoined);
    }

    #[tokio::test]
    async fn test_reconcile_skips_unsubscribed_and_audio() {
        let connector = Arc::new(MemoryConnector::new("lobby"));
        let room = connector.room().clone();
        room.add_publication("alice", MemoryTrack::new("TR_cam", TrackKind::Video), true);
        room.add_publication("alice", MemoryTrack::new("TR_mic", TrackKind::Audio), true);
        room.add_publication("bob", MemoryTrack::new("TR_cam_b", TrackKind::Video), false);
        room.add_pending_publication("carol", "TR_pending", TrackKind::Video);

        let surface = Arc::new(MemorySurface::element());
        let handle = setup_room(connector, config(), "tok-abc", "lobby", surface.clone())
            .await
            .unwrap();

        assert_eq!(surface.child_count(), 1);
        assert_eq!(surface.children()[0].track_sid, TrackSid::new("TR_cam"));
        assert_eq!(handle.attached_track_count(), 1);
    }

    #[tokio::test]
    async fn test_publish_after_disconnect_is_invalid_state() {
        let connector = Arc::new(MemoryConnector::new("lobby"));
        let surface = Arc::new(MemorySurface::element());
        let handle = setup_room(connector.clone(), config(), "tok-abc", "lobby", surface)
            .await
            .unwrap();

        handle.disconnect().await;
        let err = handle.publish_local_video().await.unwrap_err();
        assert!(matches!(err, RoomError::InvalidState { .. }));
        assert!(connector.camera_requests().is_empty());
    }

    #[tokio::test]
    #[traced_test]
    async fn test_empty_room_name_warns_and_joins() {
        let connector = Arc::new(MemoryConnector::new("granted-by-token"));
        let surface = Arc::new(MemorySurface::element());
        let handle = setup_room(connector.clone(), config(), "tok-abc", "", surface)
            .await
            .unwrap();

        assert!(logs_contain("Room name is empty"));
        assert_eq!(handle.state(), SessionState::Joined);
        assert_eq!(connector.connect_calls(), 1);
    }

    #[tokio::test]
    #[traced_test]
    async fn test_disconnect_failure_is_logged_not_returned() {
        let connector = Arc::new(MemoryConnector::new("lobby"));
        connector.room().fail_disconnect(SdkError::Network("socket reset".to_string()));
        let surface = Arc::new(MemorySurface::element());
        let handle = setup_room(connector, config(), "tok-abc", "lobby", surface)
            .await
            .unwrap();

        handle.disconnect().await;
        assert!(logs_contain("Error disconnecting from room"));
        assert_eq!(handle.state(), SessionState::Disconnected);
    }
}
