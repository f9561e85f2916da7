//! Credential handoff to the client page
//!
//! The backend gives the page what the room bootstrapper needs to join: a
//! signed token plus either the room it grants or the WebSocket URL of the
//! media server.

use serde::{Deserialize, Serialize};

/// Body of the token endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
    pub room: String,
}

/// Values the client page is rendered with
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageContext {
    pub livekit_url: String,
    pub access_token: String,
}
