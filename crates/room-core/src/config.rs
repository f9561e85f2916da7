//! Room client configuration and server URL resolution
//!
//! The media server URL is either given explicitly through
//! [`RoomConfig::server_url`] or derived from the location of the page that
//! hosts the render surface: a page served over `https:` talks to `wss://`,
//! anything else to `ws://`, on the same host and port.
//!
//! ```rust
//! use verdant_room_core::config::{PageLocation, RoomConfig};
//!
//! let config = RoomConfig::new()
//!     .with_page_location(PageLocation::new("https:", "meet.example.com", ""));
//! assert_eq!(config.resolve_server_url().unwrap(), "wss://meet.example.com");
//!
//! let config = config.with_server_url("ws://127.0.0.1:7880");
//! assert_eq!(config.resolve_server_url().unwrap(), "ws://127.0.0.1:7880");
//! ```

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{RoomError, RoomResult};
use crate::types::FacingMode;

/// Environment variable holding the server URL override
pub const SERVER_URL_ENV: &str = "LIVEKIT_URL";

/// Location of the page hosting the room view
///
/// Mirrors the browser's `location` fields: `protocol` keeps its trailing
/// colon and `port` is empty when the scheme's default port is in use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageLocation {
    pub protocol: String,
    pub hostname: String,
    #[serde(default)]
    pub port: String,
}

impl PageLocation {
    pub fn new(
        protocol: impl Into<String>,
        hostname: impl Into<String>,
        port: impl Into<String>,
    ) -> Self {
        Self {
            protocol: protocol.into(),
            hostname: hostname.into(),
            port: port.into(),
        }
    }

    /// Build a location from a full page URL such as `https://host:8443/room`
    pub fn from_url(page_url: &str) -> RoomResult<Self> {
        let url = Url::parse(page_url)
            .map_err(|e| RoomError::config(format!("Invalid page URL '{}': {}", page_url, e)))?;
        let hostname = url
            .host_str()
            .ok_or_else(|| RoomError::config(format!("Page URL '{}' has no host", page_url)))?;

        Ok(Self {
            protocol: format!("{}:", url.scheme()),
            hostname: hostname.to_string(),
            // `Url::port` is None for the scheme default, like `location.port`
            port: url.port().map(|p| p.to_string()).unwrap_or_default(),
        })
    }

    pub fn is_secure(&self) -> bool {
        self.protocol == "https:"
    }

    /// Derive the WebSocket URL of a media server co-hosted with the page
    pub fn websocket_url(&self) -> RoomResult<String> {
        if self.hostname.is_empty() {
            return Err(RoomError::config("Page location has no hostname"));
        }

        let scheme = if self.is_secure() { "wss" } else { "ws" };
        let mut url = format!("{}://{}", scheme, self.hostname);
        if !self.port.is_empty() {
            url.push(':');
            url.push_str(&self.port);
        }

        Url::parse(&url).map_err(|e| {
            RoomError::config(format!("Derived server URL '{}' is invalid: {}", url, e))
        })?;
        Ok(url)
    }
}

/// Options handed to the SDK when opening a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectOptions {
    /// Subscribe to every published track without manual selection
    pub auto_subscribe: bool,
    /// Let the SDK adapt video quality to viewport and bandwidth
    pub adaptive_stream: bool,
}

impl Default for ConnectOptions {
    fn default() -> Self {
        Self {
            auto_subscribe: true,
            adaptive_stream: true,
        }
    }
}

/// Options for acquiring the local camera track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LocalVideoOptions {
    pub facing_mode: FacingMode,
}

/// Configuration for the room bootstrapper
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomConfig {
    /// Explicit media server URL; wins over the page-derived one
    #[serde(default)]
    pub server_url: Option<String>,
    /// Location of the hosting page, used when no override is set
    #[serde(default)]
    pub page_location: Option<PageLocation>,
    #[serde(default)]
    pub connect: ConnectOptions,
    #[serde(default)]
    pub camera_facing: FacingMode,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            server_url: None,
            page_location: None,
            connect: ConnectOptions::default(),
            camera_facing: FacingMode::User,
        }
    }
}

impl RoomConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Default configuration with the server URL override read from `LIVEKIT_URL`
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`RoomConfig::from_env`] with a caller-supplied variable lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            server_url: lookup(SERVER_URL_ENV).filter(|url| !url.is_empty()),
            ..Self::default()
        }
    }

    pub fn with_server_url(mut self, url: impl Into<String>) -> Self {
        self.server_url = Some(url.into());
        self
    }

    pub fn with_page_location(mut self, location: PageLocation) -> Self {
        self.page_location = Some(location);
        self
    }

    pub fn with_camera_facing(mut self, facing: FacingMode) -> Self {
        self.camera_facing = facing;
        self
    }

    pub fn with_connect_options(mut self, options: ConnectOptions) -> Self {
        self.connect = options;
        self
    }

    /// Resolve the URL the session should connect to
    pub fn resolve_server_url(&self) -> RoomResult<String> {
        resolve_server_url(self.server_url.as_deref(), self.page_location.as_ref())
    }

    pub fn local_video_options(&self) -> LocalVideoOptions {
        LocalVideoOptions {
            facing_mode: self.camera_facing,
        }
    }
}

/// Pick the override when present and non-empty, else derive from the page
pub fn resolve_server_url(
    server_override: Option<&str>,
    page: Option<&PageLocation>,
) -> RoomResult<String> {
    if let Some(url) = server_override.filter(|url| !url.is_empty()) {
        Url::parse(url).map_err(|e| {
            RoomError::config(format!("Invalid server URL override '{}': {}", url, e))
        })?;
        return Ok(url.to_string());
    }

    match page {
        Some(location) => location.websocket_url(),
        None => Err(RoomError::config(
            "No server URL override and no page location to derive one from",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_secure_page_derives_wss() {
        let location = PageLocation::new("https:", "meet.example.com", "");
        assert_eq!(location.websocket_url().unwrap(), "wss://meet.example.com");
    }

    #[test]
    fn test_plain_page_keeps_port() {
        let location = PageLocation::new("http:", "localhost", "5173");
        assert_eq!(location.websocket_url().unwrap(), "ws://localhost:5173");
    }

    #[test]
    fn test_override_wins() {
        let location = PageLocation::new("https:", "meet.example.com", "");
        let url = resolve_server_url(Some("wss://sfu.example.net"), Some(&location)).unwrap();
        assert_eq!(url, "wss://sfu.example.net");
    }

    #[test]
    fn test_empty_override_falls_back_to_page() {
        let location = PageLocation::new("http:", "10.0.0.2", "8080");
        let url = resolve_server_url(Some(""), Some(&location)).unwrap();
        assert_eq!(url, "ws://10.0.0.2:8080");
    }

    #[test]
    fn test_missing_everything_is_config_error() {
        let err = resolve_server_url(None, None).unwrap_err();
        assert!(matches!(err, RoomError::Configuration { .. }));
    }

    #[test]
    fn test_malformed_override_is_config_error() {
        let err = resolve_server_url(Some("not a url"), None).unwrap_err();
        assert!(matches!(err, RoomError::Configuration { .. }));
    }

    #[test]
    fn test_location_from_url_drops_default_port() {
        let location = PageLocation::from_url("https://meet.example.com/room/lobby").unwrap();
        assert_eq!(location, PageLocation::new("https:", "meet.example.com", ""));

        let location = PageLocation::from_url("http://127.0.0.1:8080/").unwrap();
        assert_eq!(location.port, "8080");
        assert_eq!(location.websocket_url().unwrap(), "ws://127.0.0.1:8080");
    }

    #[test]
    fn test_from_lookup_reads_override() {
        let vars: HashMap<&str, &str> = [(SERVER_URL_ENV, "ws://sfu.local:7880")].into();
        let config = RoomConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string()));
        assert_eq!(config.server_url.as_deref(), Some("ws://sfu.local:7880"));
        assert!(config.connect.auto_subscribe);
        assert!(config.connect.adaptive_stream);

        let config = RoomConfig::from_lookup(|_| Some(String::new()));
        assert!(config.server_url.is_none());
    }

    #[test]
    fn test_config_deserializes_with_defaults() {
        let config: RoomConfig = serde_json::from_str(
            r#"{ "page_location": { "protocol": "https:", "hostname": "verdant.local" } }"#,
        )
        .unwrap();
        assert_eq!(config.camera_facing, FacingMode::User);
        assert_eq!(config.connect, ConnectOptions::default());
        assert_eq!(config.resolve_server_url().unwrap(), "wss://verdant.local");
    }
}
