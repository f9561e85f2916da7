//! Room grants carried by access tokens

use serde::{Deserialize, Serialize};

/// Permissions embedded in the `video` claim of an access token
///
/// Serialized in the camelCase form the media server expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VideoGrants {
    pub room_create: bool,
    pub room_list: bool,
    pub room_record: bool,
    pub room_admin: bool,
    pub room_join: bool,
    pub room: String,
    pub can_publish: bool,
    pub can_subscribe: bool,
    pub can_publish_data: bool,
    pub hidden: bool,
    pub recorder: bool,
}

impl Default for VideoGrants {
    fn default() -> Self {
        Self {
            room_create: false,
            room_list: false,
            room_record: false,
            room_admin: false,
            room_join: false,
            room: String::new(),
            can_publish: true,
            can_subscribe: true,
            can_publish_data: true,
            hidden: false,
            recorder: false,
        }
    }
}

impl VideoGrants {
    /// Grants to join one room with default publish/subscribe rights
    pub fn join(room: impl Into<String>) -> Self {
        Self {
            room_join: true,
            room: room.into(),
            ..Default::default()
        }
    }
}

/// Application-level permission of a user on a room
///
/// The user's permission wins over anything a room admin toggles later: a
/// user who cannot publish gets no publish grant at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomPermission {
    pub room_admin: bool,
    pub can_publish: bool,
    pub can_subscribe: bool,
}

impl Default for RoomPermission {
    fn default() -> Self {
        Self {
            room_admin: false,
            can_publish: true,
            can_subscribe: true,
        }
    }
}

impl RoomPermission {
    /// Watch-only participant
    pub fn viewer() -> Self {
        Self {
            room_admin: false,
            can_publish: false,
            can_subscribe: true,
        }
    }

    pub fn admin() -> Self {
        Self {
            room_admin: true,
            can_publish: true,
            can_subscribe: true,
        }
    }

    /// Grants for joining `room` under this permission
    pub fn grants_for(&self, room: impl Into<String>) -> VideoGrants {
        VideoGrants {
            room_admin: self.room_admin,
            can_publish: self.can_publish,
            can_subscribe: self.can_subscribe,
            can_publish_data: self.can_publish,
            ..VideoGrants::join(room)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grants_serialize_camel_case() {
        let json = serde_json::to_value(VideoGrants::join("lobby")).unwrap();
        assert_eq!(json["roomJoin"], true);
        assert_eq!(json["room"], "lobby");
        assert_eq!(json["canPublish"], true);
        assert_eq!(json["canSubscribe"], true);
        assert!(json.get("room_join").is_none());
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let grants: VideoGrants =
            serde_json::from_str(r#"{ "roomJoin": true, "room": "lobby" }"#).unwrap();
        assert_eq!(grants, VideoGrants::join("lobby"));
    }

    #[test]
    fn test_viewer_permission_cannot_publish() {
        let grants = RoomPermission::viewer().grants_for("lobby");
        assert!(grants.room_join);
        assert!(!grants.can_publish);
        assert!(!grants.can_publish_data);
        assert!(grants.can_subscribe);
        assert!(!grants.room_admin);
    }

    #[test]
    fn test_admin_permission() {
        let grants = RoomPermission::admin().grants_for("ops");
        assert!(grants.room_admin);
        assert_eq!(grants.room, "ops");
    }
}
