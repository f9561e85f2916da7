//! Access token minting and verification
//!
//! Tokens are HS256 JWTs signed with the API secret. The API key is the
//! issuer, the participant identity is the subject and the room grants live
//! in the `video` claim.
//!
//! ```rust
//! use std::time::Duration;
//! use verdant_token_core::{AccessToken, TokenVerifier, VideoGrants};
//!
//! let jwt = AccessToken::with_api_key("APIkey", "secret")
//!     .with_identity("alice")
//!     .with_name("Alice")
//!     .with_grants(VideoGrants::join("lobby"))
//!     .with_ttl(Duration::from_secs(3600))
//!     .to_jwt()
//!     .unwrap();
//!
//! let claims = TokenVerifier::new("APIkey", "secret").verify(&jwt).unwrap();
//! assert_eq!(claims.sub, "alice");
//! assert_eq!(claims.video.room, "lobby");
//! ```

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

use crate::error::{TokenError, TokenResult};
use crate::grants::VideoGrants;

/// Default token lifetime
pub const DEFAULT_TTL: Duration = Duration::from_secs(6 * 60 * 60);

/// Claims of a room access token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub iss: String,              // API key
    pub sub: String,              // Participant identity
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub nbf: u64,
    pub exp: u64,
    pub jti: String,
    pub video: VideoGrants,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<String>,
}

/// Builder for a signed room access token
#[derive(Debug, Clone)]
pub struct AccessToken {
    api_key: String,
    api_secret: String,
    identity: String,
    name: Option<String>,
    metadata: Option<String>,
    grants: VideoGrants,
    ttl: Duration,
}

impl AccessToken {
    pub fn with_api_key(api_key: &str, api_secret: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            api_secret: api_secret.to_string(),
            identity: String::new(),
            name: None,
            metadata: None,
            grants: VideoGrants::default(),
            ttl: DEFAULT_TTL,
        }
    }

    pub fn with_identity(mut self, identity: &str) -> Self {
        self.identity = identity.to_string();
        self
    }

    /// Display name shown to other participants
    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn with_metadata(mut self, metadata: &str) -> Self {
        self.metadata = Some(metadata.to_string());
        self
    }

    pub fn with_grants(mut self, grants: VideoGrants) -> Self {
        self.grants = grants;
        self
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Sign the token
    pub fn to_jwt(self) -> TokenResult<String> {
        if self.api_key.is_empty() || self.api_secret.is_empty() {
            return Err(TokenError::invalid_credentials("API key and secret must be non-empty"));
        }
        if self.grants.room_join && self.identity.is_empty() {
            return Err(TokenError::MissingIdentity);
        }

        let now = chrono::Utc::now().timestamp().max(0) as u64;
        let claims = Claims {
            iss: self.api_key,
            sub: self.identity,
            name: self.name,
            nbf: now,
            exp: now.saturating_add(self.ttl.as_secs()),
            jti: Uuid::new_v4().to_string(),
            video: self.grants,
            metadata: self.metadata,
        };

        debug!("Signing access token for '{}' (room '{}')", claims.sub, claims.video.room);
        let key = EncodingKey::from_secret(self.api_secret.as_bytes());
        Ok(encode(&Header::new(Algorithm::HS256), &claims, &key)?)
    }
}

/// Verifies tokens signed with a given API key and secret
pub struct TokenVerifier {
    api_key: String,
    decoding_key: DecodingKey,
    leeway: u64,
}

impl TokenVerifier {
    pub fn new(api_key: &str, api_secret: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            decoding_key: DecodingKey::from_secret(api_secret.as_bytes()),
            leeway: 60,
        }
    }

    /// Clock skew tolerated on `exp` and `nbf`, in seconds
    pub fn with_leeway(mut self, seconds: u64) -> Self {
        self.leeway = seconds;
        self
    }

    /// Check signature, issuer and validity window, returning the claims
    pub fn verify(&self, token: &str) -> TokenResult<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.api_key]);
        validation.validate_nbf = true;
        validation.validate_aud = false;
        validation.leeway = self.leeway;

        let data = decode::<Claims>(token, &self.decoding_key, &validation)?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_identity_rejected_for_join() {
        let err = AccessToken::with_api_key("key", "secret")
            .with_grants(VideoGrants::join("lobby"))
            .to_jwt()
            .unwrap_err();
        assert!(matches!(err, TokenError::MissingIdentity));
    }

    #[test]
    fn test_identity_optional_without_join() {
        let grants = VideoGrants {
            room_list: true,
            ..Default::default()
        };
        let jwt = AccessToken::with_api_key("key", "secret").with_grants(grants).to_jwt().unwrap();
        let claims = TokenVerifier::new("key", "secret").verify(&jwt).unwrap();
        assert!(claims.video.room_list);
        assert!(claims.sub.is_empty());
    }

    #[test]
    fn test_empty_secret_rejected() {
        let err = AccessToken::with_api_key("key", "")
            .with_identity("alice")
            .to_jwt()
            .unwrap_err();
        assert!(matches!(err, TokenError::InvalidCredentials { .. }));
    }

    #[test]
    fn test_ttl_sets_validity_window() {
        let jwt = AccessToken::with_api_key("key", "secret")
            .with_identity("alice")
            .with_grants(VideoGrants::join("lobby"))
            .with_ttl(Duration::from_secs(900))
            .to_jwt()
            .unwrap();

        let claims = TokenVerifier::new("key", "secret").verify(&jwt).unwrap();
        assert_eq!(claims.exp - claims.nbf, 900);
        assert_eq!(claims.iss, "key");
        assert!(claims.name.is_none());
    }

    #[test]
    fn test_huge_ttl_saturates_instead_of_wrapping() {
        let jwt = AccessToken::with_api_key("key", "secret")
            .with_identity("alice")
            .with_grants(VideoGrants::join("lobby"))
            .with_ttl(Duration::from_secs(u64::MAX))
            .to_jwt()
            .unwrap();

        let claims = TokenVerifier::new("key", "secret").verify(&jwt).unwrap();
        assert_eq!(claims.exp, u64::MAX);
        assert!(claims.exp > claims.nbf);
    }

    #[test]
    fn test_metadata_is_carried_in_claims() {
        let jwt = AccessToken::with_api_key("key", "secret")
            .with_identity("alice")
            .with_metadata(r#"{"role":"host"}"#)
            .to_jwt()
            .unwrap();

        let claims = TokenVerifier::new("key", "secret").verify(&jwt).unwrap();
        assert_eq!(claims.metadata.as_deref(), Some(r#"{"role":"host"}"#));
    }

    #[test]
    fn test_leeway_accepts_recently_expired_token() {
        let now = chrono::Utc::now().timestamp() as u64;
        let claims = Claims {
            iss: "key".to_string(),
            sub: "alice".to_string(),
            name: None,
            nbf: now - 600,
            exp: now - 120,
            jti: Uuid::new_v4().to_string(),
            video: VideoGrants::join("lobby"),
            metadata: None,
        };
        let jwt = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"secret"),
        )
        .unwrap();

        assert!(TokenVerifier::new("key", "secret").verify(&jwt).is_err());
        let verified = TokenVerifier::new("key", "secret").with_leeway(300).verify(&jwt).unwrap();
        assert_eq!(verified.sub, "alice");
    }

    #[test]
    fn test_wrong_secret_fails_verification() {
        let jwt = AccessToken::with_api_key("key", "secret")
            .with_identity("alice")
            .to_jwt()
            .unwrap();

        let err = TokenVerifier::new("key", "other-secret").verify(&jwt).unwrap_err();
        assert!(matches!(err, TokenError::Jwt(_)));
    }

    #[test]
    fn test_wrong_issuer_fails_verification() {
        let jwt = AccessToken::with_api_key("key", "secret")
            .with_identity("alice")
            .to_jwt()
            .unwrap();

        assert!(TokenVerifier::new("another-key", "secret").verify(&jwt).is_err());
    }

    #[test]
    fn test_tokens_are_unique() {
        let mint = || {
            AccessToken::with_api_key("key", "secret")
                .with_identity("alice")
                .to_jwt()
                .unwrap()
        };
        let verifier = TokenVerifier::new("key", "secret");
        let a = verifier.verify(&mint()).unwrap();
        let b = verifier.verify(&mint()).unwrap();
        assert_ne!(a.jti, b.jti);
    }
}
