//! # Token-Core
//!
//! Join credentials for Verdant video rooms.
//!
//! This crate provides:
//! - LiveKit-style access tokens (HS256 JWT with a `video` grant block)
//! - Token verification against an API key and secret
//! - Mapping from application-level room permissions to grants
//! - LiveKit server settings loaded from the environment or a JSON file
//! - The token endpoint body and page context handed to the browser
//!
//! The browser side hands the minted token to the room bootstrapper in
//! `verdant-room-core` as its credential.

pub mod config;
pub mod error;
pub mod grants;
pub mod handoff;
pub mod token;

pub use config::LivekitConfig;
pub use error::{TokenError, TokenResult};
pub use grants::{RoomPermission, VideoGrants};
pub use handoff::{PageContext, TokenResponse};
pub use token::{AccessToken, Claims, DEFAULT_TTL, TokenVerifier};
