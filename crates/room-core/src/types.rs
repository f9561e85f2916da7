//! Core types shared by the bootstrapper, the SDK seam and the render surface

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Media kind of a track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackKind {
    Audio,
    Video,
}

impl fmt::Display for TrackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackKind::Audio => write!(f, "audio"),
            TrackKind::Video => write!(f, "video"),
        }
    }
}

/// Server-assigned track identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TrackSid(pub String);

impl TrackSid {
    pub fn new(sid: impl Into<String>) -> Self {
        Self(sid.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TrackSid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Participant identity as encoded in the join credential
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ParticipantIdentity(pub String);

impl ParticipantIdentity {
    pub fn new(identity: impl Into<String>) -> Self {
        Self(identity.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ParticipantIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identity of a rendering element created for a track
pub type ElementId = Uuid;

/// Inline style applied to a rendering element
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementStyle {
    pub max_width: Option<String>,
    pub max_height: Option<String>,
}

impl ElementStyle {
    /// Constrain the element to its container's bounding box
    pub fn fit_container() -> Self {
        Self {
            max_width: Some("100%".to_string()),
            max_height: Some("100%".to_string()),
        }
    }
}

/// A rendering element (a `<video>` or `<audio>` node) bound to a track
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaElement {
    pub id: ElementId,
    pub track_sid: TrackSid,
    pub kind: TrackKind,
    pub style: ElementStyle,
}

impl MediaElement {
    pub fn new(track_sid: TrackSid, kind: TrackKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            track_sid,
            kind,
            style: ElementStyle::default(),
        }
    }
}

/// Which camera to open for the local preview
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FacingMode {
    /// Front-facing camera
    #[default]
    User,
    /// Rear-facing camera
    Environment,
}

/// Lifecycle of a room session as seen by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    Unjoined,
    Joining,
    Joined,
    /// Joined and the local camera has been published
    Publishing,
    Disconnecting,
    Disconnected,
}

impl SessionState {
    /// Whether the session is usable for publishing
    pub fn is_active(&self) -> bool {
        matches!(self, SessionState::Joined | SessionState::Publishing)
    }

    /// Whether disconnect has started or finished
    pub fn is_closing(&self) -> bool {
        matches!(self, SessionState::Disconnecting | SessionState::Disconnected)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Unjoined => "unjoined",
            SessionState::Joining => "joining",
            SessionState::Joined => "joined",
            SessionState::Publishing => "publishing",
            SessionState::Disconnecting => "disconnecting",
            SessionState::Disconnected => "disconnected",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_container_style() {
        let style = ElementStyle::fit_container();
        assert_eq!(style.max_width.as_deref(), Some("100%"));
        assert_eq!(style.max_height.as_deref(), Some("100%"));
    }

    #[test]
    fn test_track_kind_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&TrackKind::Video).unwrap(), "\"video\"");
        let kind: TrackKind = serde_json::from_str("\"audio\"").unwrap();
        assert_eq!(kind, TrackKind::Audio);
    }

    #[test]
    fn test_session_state_predicates() {
        assert!(SessionState::Joined.is_active());
        assert!(SessionState::Publishing.is_active());
        assert!(!SessionState::Joining.is_active());
        assert!(SessionState::Disconnecting.is_closing());
        assert!(!SessionState::Joined.is_closing());
    }

    #[test]
    fn test_new_elements_are_distinct() {
        let sid = TrackSid::new("TR_video");
        let a = MediaElement::new(sid.clone(), TrackKind::Video);
        let b = MediaElement::new(sid, TrackKind::Video);
        assert_ne!(a.id, b.id);
        assert_eq!(a.style, ElementStyle::default());
    }
}
