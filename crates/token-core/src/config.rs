//! LiveKit server settings

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;
use url::Url;

use crate::error::{TokenError, TokenResult};
use crate::grants::{RoomPermission, VideoGrants};
use crate::handoff::{PageContext, TokenResponse};
use crate::token::AccessToken;

/// How to reach and sign for the media server
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LivekitConfig {
    pub base_url: String, // e.g. "https://livekit.example.com"
    pub api_key: String,
    pub api_secret: String, // HMAC signing secret
}

impl LivekitConfig {
    pub fn new(base_url: &str, api_key: &str, api_secret: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            api_key: api_key.to_string(),
            api_secret: api_secret.to_string(),
        }
    }

    /// Load from `LIVEKIT_URL` (or `LIVEKIT_BASE_URL`), `LIVEKIT_API_KEY` and `LIVEKIT_API_SECRET`
    pub fn from_env() -> TokenResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`LivekitConfig::from_env`] with a caller-supplied variable lookup
    pub fn from_lookup<F>(lookup: F) -> TokenResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let require = |key: &str| {
            lookup(key)
                .filter(|value| !value.is_empty())
                .ok_or_else(|| {
                    TokenError::config(format!("environment variable {} must be set", key))
                })
        };

        let base_url = require("LIVEKIT_URL")
            .or_else(|_| require("LIVEKIT_BASE_URL"))
            .map_err(|_| {
                TokenError::config(
                    "environment variable LIVEKIT_URL or LIVEKIT_BASE_URL must be set",
                )
            })?;

        let config = Self {
            base_url,
            api_key: require("LIVEKIT_API_KEY")?,
            api_secret: require("LIVEKIT_API_SECRET")?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Load from a JSON file with `base_url`, `api_key` and `api_secret`
    pub fn from_json_file(path: impl AsRef<Path>) -> TokenResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&contents)?;
        config.validate()?;
        info!("Loaded LiveKit settings from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> TokenResult<()> {
        self.parse_base_url()?;
        if self.api_key.is_empty() || self.api_secret.is_empty() {
            return Err(TokenError::invalid_credentials("api_key and api_secret must be non-empty"));
        }
        Ok(())
    }

    /// WebSocket URL to hand to the page (`http` → `ws`, `https` → `wss`)
    pub fn client_url(&self) -> TokenResult<String> {
        let mut url = self.parse_base_url()?;

        let scheme = match url.scheme() {
            "http" | "ws" => "ws",
            "https" | "wss" => "wss",
            other => {
                return Err(TokenError::config(format!(
                    "Unsupported base_url scheme '{}'",
                    other
                )));
            }
        };
        url.set_scheme(scheme).map_err(|_| {
            TokenError::config(format!("Cannot use base_url '{}' as {}", self.base_url, scheme))
        })?;

        // A bare origin serializes with a trailing '/'
        let bare = url.path() == "/" && url.query().is_none() && url.fragment().is_none();
        let mut client = String::from(url);
        if bare {
            client.pop();
        }
        Ok(client)
    }

    /// Payload of the token endpoint: a join token for `identity` in its own room
    pub fn token_response(&self, identity: &str) -> TokenResult<TokenResponse> {
        Ok(TokenResponse {
            token: self.access_token(identity, None)?,
            room: identity.to_string(),
        })
    }

    /// Context the client page is rendered with
    pub fn page_context(&self, identity: &str) -> TokenResult<PageContext> {
        Ok(PageContext {
            livekit_url: self.client_url()?,
            access_token: self.access_token(identity, None)?,
        })
    }

    /// Join token for `identity`; the room defaults to the identity itself
    pub fn access_token(&self, identity: &str, room: Option<&str>) -> TokenResult<String> {
        self.access_token_with_grants(identity, VideoGrants::join(room.unwrap_or(identity)))
    }

    /// Join token honoring an application-level room permission
    pub fn access_token_for(
        &self,
        identity: &str,
        room: &str,
        permission: RoomPermission,
    ) -> TokenResult<String> {
        self.access_token_with_grants(identity, permission.grants_for(room))
    }

    fn parse_base_url(&self) -> TokenResult<Url> {
        Url::parse(&self.base_url)
            .map_err(|e| TokenError::config(format!("Invalid base_url '{}': {}", self.base_url, e)))
    }

    fn access_token_with_grants(&self, identity: &str, grants: VideoGrants) -> TokenResult<String> {
        AccessToken::with_api_key(&self.api_key, &self.api_secret)
            .with_identity(identity)
            .with_name(identity)
            .with_grants(grants)
            .to_jwt()
    }
}
