//! Offline walkthrough of a room session using the in-memory SDK
//!
//! Run with `RUST_LOG=verdant_room_core=debug` to see attach/detach logging.

use std::sync::Arc;
use tokio_stream::StreamExt;
use tracing_subscriber::EnvFilter;
use verdant_room_core::memory::{MemoryConnector, MemorySurface, MemoryTrack};
use verdant_room_core::{
    PageLocation, RenderSurface, RoomConfig, RoomSessionBootstrapper, TrackKind,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let page = PageLocation::from_url("http://localhost:5173/room/lobby")?;
    let config = RoomConfig::from_env().with_page_location(page);

    let connector = Arc::new(MemoryConnector::new("lobby"));
    let surface = Arc::new(MemorySurface::element());

    // Someone was already streaming before we joined
    connector
        .room()
        .add_publication("alice", MemoryTrack::new("TR_alice_cam", TrackKind::Video), true);

    let bootstrapper = RoomSessionBootstrapper::new(connector.clone(), config);
    let mut events = bootstrapper.events();
    let room = bootstrapper.setup("tok-abc", "lobby", surface.clone()).await?;
    println!("joined {} with {} element(s) mounted", room.server_url(), surface.child_count());

    connector
        .room()
        .subscribe_track("bob", MemoryTrack::new("TR_bob_cam", TrackKind::Video));
    connector
        .room()
        .subscribe_track("bob", MemoryTrack::new("TR_bob_mic", TrackKind::Audio));
    room.publish_local_video().await?;
    println!("after bob joined and we published: {} element(s)", surface.child_count());

    connector.room().unsubscribe_track("bob", "TR_bob_cam");
    room.disconnect().await;
    println!("after disconnect: {} element(s)", surface.child_count());

    while let Some(Ok(event)) = events.next().await {
        println!("event: {:?}", event);
        if event == verdant_room_core::RoomClientEvent::Disconnected {
            break;
        }
    }

    Ok(())
}
