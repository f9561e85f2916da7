//! # Room-Core - Video room bootstrapping for Verdant
//!
//! This crate joins a real-time video room through a media-room SDK and keeps
//! a caller-owned render surface in sync with the room's video tracks:
//!
//! - **Bootstrapping**: input validation, server URL resolution, join with
//!   automatic subscription and adaptive streaming
//! - **Rendering**: video elements mounted on subscribe, removed on
//!   unsubscribe or disconnect
//! - **Local preview**: optional camera publish, mounted like any other track
//! - **Events**: a broadcast stream of what happened to the session
//!
//! Transport, negotiation and track lifecycle stay inside the SDK, reached
//! through the traits in [`sdk`]. The [`memory`] module provides an
//! in-process implementation of those traits.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use verdant_room_core::memory::{MemoryConnector, MemorySurface, MemoryTrack};
//! use verdant_room_core::{
//!     PageLocation, RenderSurface, RoomConfig, RoomSessionBootstrapper, TrackKind,
//! };
//!
//! # tokio_test::block_on(async {
//! let connector = Arc::new(MemoryConnector::new("lobby"));
//! let page = PageLocation::new("https:", "meet.example.com", "");
//! let config = RoomConfig::new().with_page_location(page);
//! let surface = Arc::new(MemorySurface::element());
//!
//! let bootstrapper = RoomSessionBootstrapper::new(connector.clone(), config);
//! let room = bootstrapper.setup("tok-abc", "lobby", surface.clone()).await.unwrap();
//! assert_eq!(room.server_url(), "wss://meet.example.com");
//!
//! connector.room().subscribe_track("alice", MemoryTrack::new("TR_alice", TrackKind::Video));
//! assert_eq!(surface.child_count(), 1);
//!
//! room.publish_local_video().await.unwrap();
//! assert_eq!(surface.child_count(), 2);
//!
//! room.disconnect().await;
//! assert_eq!(surface.child_count(), 0);
//! # });
//! ```

pub mod bootstrap;
pub mod config;
pub mod error;
pub mod events;
pub mod memory;
pub mod renderer;
pub mod sdk;
pub mod surface;
pub mod types;

pub use bootstrap::{RoomHandle, RoomSessionBootstrapper, setup_room};
pub use config::{ConnectOptions, LocalVideoOptions, PageLocation, RoomConfig};
pub use error::{RoomError, RoomResult, SdkError};
pub use events::{EventEmitter, EventStream, RoomClientEvent};
pub use renderer::TrackRenderer;
pub use sdk::{
    HandlerId, RemoteParticipant, RoomConnector, RoomEventHandler, RoomSession, RoomTrack,
    TrackPublication,
};
pub use surface::{RenderSurface, SurfaceKind};
pub use types::{
    ElementId, ElementStyle, FacingMode, MediaElement, ParticipantIdentity, SessionState,
    TrackKind, TrackSid,
};
