//! Track → element bookkeeping
//!
//! [`TrackRenderer`] owns the mapping from a track to the elements mounted
//! for it on the render surface. Every element it appends is removed exactly
//! once: either when the track is unsubscribed or when the session ends.

use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::debug;

use crate::events::{EventEmitter, RoomClientEvent};
use crate::sdk::RoomTrack;
use crate::surface::RenderSurface;
use crate::types::{ElementStyle, MediaElement, ParticipantIdentity, TrackSid};

struct AttachedTrack {
    track: Arc<dyn RoomTrack>,
    elements: Vec<MediaElement>,
}

/// Mounts and unmounts track elements on a render surface
pub struct TrackRenderer {
    surface: Arc<dyn RenderSurface>,
    attached: Mutex<HashMap<TrackSid, AttachedTrack>>,
    emitter: EventEmitter,
}

impl TrackRenderer {
    pub fn new(surface: Arc<dyn RenderSurface>, emitter: EventEmitter) -> Self {
        Self {
            surface,
            attached: Mutex::new(HashMap::new()),
            emitter,
        }
    }

    pub fn surface(&self) -> &Arc<dyn RenderSurface> {
        &self.surface
    }

    /// Mount a track, returning false when it is already mounted
    pub fn attach(
        &self,
        track: Arc<dyn RoomTrack>,
        participant: Option<&ParticipantIdentity>,
    ) -> bool {
        let sid = track.sid();
        {
            let mut attached = self.attached.lock();
            if attached.contains_key(&sid) {
                debug!("Track {} already attached, skipping", sid);
                return false;
            }

            let mut element = track.attach();
            element.style = ElementStyle::fit_container();
            self.surface.append_child(element.clone());
            attached.insert(
                sid.clone(),
                AttachedTrack {
                    track,
                    elements: vec![element],
                },
            );
        }

        debug!("Attached track {} ({} on surface)", sid, self.surface.child_count());
        self.emitter.emit(RoomClientEvent::TrackAttached {
            track_sid: sid,
            participant: participant.cloned(),
        });
        true
    }

    /// Unmount every element rendered for a track, returning how many left the surface
    pub fn detach(&self, track: &Arc<dyn RoomTrack>) -> usize {
        let sid = track.sid();
        let recorded = self
            .attached
            .lock()
            .remove(&sid)
            .map(|entry| entry.elements)
            .unwrap_or_default();

        self.remove_elements(&sid, recorded, track.detach())
    }

    /// Unmount everything still mounted; used when the session ends
    pub fn detach_all(&self) -> usize {
        let drained: Vec<(TrackSid, AttachedTrack)> = self.attached.lock().drain().collect();

        drained
            .into_iter()
            .map(|(sid, entry)| {
                let released = entry.track.detach();
                self.remove_elements(&sid, entry.elements, released)
            })
            .sum()
    }

    pub fn is_attached(&self, sid: &TrackSid) -> bool {
        self.attached.lock().contains_key(sid)
    }

    pub fn attached_track_count(&self) -> usize {
        self.attached.lock().len()
    }

    fn remove_elements(
        &self,
        sid: &TrackSid,
        recorded: Vec<MediaElement>,
        released: Vec<MediaElement>,
    ) -> usize {
        let mut seen = HashSet::new();
        let removed = recorded
            .into_iter()
            .chain(released)
            .filter(|element| seen.insert(element.id))
            .filter(|element| self.surface.remove_child(element.id))
            .count();

        if removed > 0 {
            debug!("Detached track {} ({} elements removed)", sid, removed);
            self.emitter.emit(RoomClientEvent::TrackDetached {
                track_sid: sid.clone(),
                elements_removed: removed,
            });
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{MemorySurface, MemoryTrack};
    use crate::types::TrackKind;

    fn renderer() -> (TrackRenderer, Arc<MemorySurface>) {
        let surface = Arc::new(MemorySurface::element());
        (TrackRenderer::new(surface.clone(), EventEmitter::default()), surface)
    }

    #[test]
    fn test_attach_styles_and_appends() {
        let (renderer, surface) = renderer();
        let track: Arc<dyn RoomTrack> = MemoryTrack::new("TR_cam", TrackKind::Video);

        assert!(renderer.attach(track.clone(), None));
        assert_eq!(surface.child_count(), 1);

        let child = &surface.children()[0];
        assert_eq!(child.style, ElementStyle::fit_container());
        assert_eq!(child.track_sid, TrackSid::new("TR_cam"));
    }

    #[test]
    fn test_attach_twice_is_ignored() {
        let (renderer, surface) = renderer();
        let track: Arc<dyn RoomTrack> = MemoryTrack::new("TR_cam", TrackKind::Video);

        assert!(renderer.attach(track.clone(), None));
        assert!(!renderer.attach(track, None));
        assert_eq!(surface.child_count(), 1);
    }

    #[test]
    fn test_detach_removes_each_element_once() {
        let (renderer, surface) = renderer();
        let track: Arc<dyn RoomTrack> = MemoryTrack::new("TR_cam", TrackKind::Video);

        renderer.attach(track.clone(), None);
        assert!(renderer.is_attached(&TrackSid::new("TR_cam")));
        // The SDK and the renderer both know the element; it must go only once
        assert_eq!(renderer.detach(&track), 1);
        assert!(!renderer.is_attached(&TrackSid::new("TR_cam")));
        assert_eq!(surface.child_count(), 0);
        assert_eq!(surface.removal_count(), 1);

        assert_eq!(renderer.detach(&track), 0);
        assert_eq!(surface.removal_count(), 1);
    }

    #[test]
    fn test_detach_all_clears_surface() {
        let (renderer, surface) = renderer();
        let a: Arc<dyn RoomTrack> = MemoryTrack::new("TR_a", TrackKind::Video);
        let b: Arc<dyn RoomTrack> = MemoryTrack::new("TR_b", TrackKind::Video);

        renderer.attach(a, None);
        renderer.attach(b, None);
        assert_eq!(renderer.attached_track_count(), 2);

        assert_eq!(renderer.detach_all(), 2);
        assert_eq!(surface.child_count(), 0);
        assert_eq!(renderer.attached_track_count(), 0);
    }

    #[test]
    fn test_detach_leaves_foreign_children() {
        let (renderer, surface) = renderer();
        let foreign = MediaElement::new(TrackSid::new("static"), TrackKind::Video);
        surface.append_child(foreign.clone());

        let track: Arc<dyn RoomTrack> = MemoryTrack::new("TR_cam", TrackKind::Video);
        renderer.attach(track.clone(), None);
        renderer.detach(&track);

        assert_eq!(surface.child_count(), 1);
        assert!(surface.contains(foreign.id));
    }
}
