//! Authentication state derived from collection-store bearer tokens.
//!
//! The hosted store issues JWT auth tokens to the browser; requests to this
//! server forward them in the `Authorization` header. Locally we only check
//! that the token is well-formed and unexpired and extract the auth record ID
//! from its payload (the same check the store's own client library performs).
//! The store remains the real verifier: a forged token fails there on any
//! actual write with an auth rule.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::Deserialize;
use sugarplum_core::UserId;

/// Claims we care about from the store's auth token.
#[derive(Debug, Deserialize)]
struct TokenClaims {
    /// Auth record ID.
    id: String,
    /// Expiry as unix seconds.
    exp: i64,
}

/// A validated (well-formed, unexpired) authentication state.
#[derive(Debug, Clone)]
pub struct AuthState {
    user_id: UserId,
}

impl AuthState {
    /// Parse an `Authorization` header value, accepting `Bearer <token>` or a
    /// bare token. Returns `None` when absent, malformed, or expired.
    #[must_use]
    pub fn from_header(header: Option<&str>) -> Option<Self> {
        let header = header?;
        let token = header.strip_prefix("Bearer ").unwrap_or(header);
        Self::from_token(token)
    }

    /// Parse a raw auth token.
    #[must_use]
    pub fn from_token(token: &str) -> Option<Self> {
        Self::from_token_at(token, chrono::Utc::now().timestamp())
    }

    fn from_token_at(token: &str, now: i64) -> Option<Self> {
        let mut parts = token.split('.');
        let (_header, payload, _signature) = (parts.next()?, parts.next()?, parts.next()?);
        if parts.next().is_some() {
            return None;
        }

        let decoded = URL_SAFE_NO_PAD.decode(payload).ok()?;
        let claims: TokenClaims = serde_json::from_slice(&decoded).ok()?;

        if claims.exp <= now || claims.id.is_empty() {
            return None;
        }

        Some(Self {
            user_id: UserId::new(claims.id),
        })
    }

    /// The authenticated user's record ID.
    #[must_use]
    pub const fn user_id(&self) -> &UserId {
        &self.user_id
    }
}
