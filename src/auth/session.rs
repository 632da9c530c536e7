// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Patros Labs

//! Signed session tokens and refresh token handling.
//!
//! A session token is `base64url(claims JSON) . base64url(HMAC-SHA256)`,
//! signed with the server's `SESSION_SECRET`. Verification is pure key
//! material and arithmetic; no per-request storage reads. Session state
//! therefore never outlives the token — the only persisted artifact of a
//! session is the refresh token hash.

use base64ct::{Base64UrlUnpadded, Encoding};
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::models::ChainAddress;

use super::{AuthError, Role};

type HmacSha256 = Hmac<Sha256>;

/// Session lifetime.
pub const SESSION_TTL: Duration = Duration::hours(1);

/// Refresh token lifetime.
pub const REFRESH_TTL: Duration = Duration::days(30);

/// Claims carried inside a session token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionClaims {
    pub user_id: String,
    pub address_id: String,
    pub address: ChainAddress,
    pub role: Role,
    /// Unix timestamp (seconds)
    pub expires_at: i64,
}

impl SessionClaims {
    pub fn new(
        user_id: String,
        address_id: String,
        address: ChainAddress,
        role: Role,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id,
            address_id,
            address,
            role,
            expires_at: (now + SESSION_TTL).timestamp(),
        }
    }
}

/// HMAC key for session tokens.
#[derive(Clone)]
pub struct SessionKeys {
    secret: Vec<u8>,
}

impl SessionKeys {
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Serialize and sign claims into a token.
    pub fn sign(&self, claims: &SessionClaims) -> Result<String, AuthError> {
        let payload = serde_json::to_vec(claims)
            .map_err(|e| AuthError::InternalError(format!("claims serialization: {e}")))?;
        let payload_b64 = Base64UrlUnpadded::encode_string(&payload);

        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .map_err(|e| AuthError::InternalError(format!("hmac key: {e}")))?;
        mac.update(payload_b64.as_bytes());
        let sig_b64 = Base64UrlUnpadded::encode_string(&mac.finalize().into_bytes());

        Ok(format!("{payload_b64}.{sig_b64}"))
    }

    /// Verify a token's signature and expiry, returning its claims.
    pub fn verify(&self, token: &str) -> Result<SessionClaims, AuthError> {
        let (payload_b64, sig_b64) = token
            .split_once('.')
            .ok_or(AuthError::InvalidSessionToken)?;

        let sig = Base64UrlUnpadded::decode_vec(sig_b64)
            .map_err(|_| AuthError::InvalidSessionToken)?;

        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .map_err(|e| AuthError::InternalError(format!("hmac key: {e}")))?;
        mac.update(payload_b64.as_bytes());
        mac.verify_slice(&sig)
            .map_err(|_| AuthError::InvalidSessionToken)?;

        let payload = Base64UrlUnpadded::decode_vec(payload_b64)
            .map_err(|_| AuthError::InvalidSessionToken)?;
        let claims: SessionClaims =
            serde_json::from_slice(&payload).map_err(|_| AuthError::InvalidSessionToken)?;

        if Utc::now().timestamp() >= claims.expires_at {
            return Err(AuthError::SessionExpired);
        }
        Ok(claims)
    }
}

/// Generate an opaque refresh token (256 bits of randomness, base64url).
pub fn generate_refresh_token() -> String {
    let mut bytes = [0u8; 32];
    bytes[..16].copy_from_slice(uuid::Uuid::new_v4().as_bytes());
    bytes[16..].copy_from_slice(uuid::Uuid::new_v4().as_bytes());
    Base64UrlUnpadded::encode_string(&bytes)
}

/// Hash a refresh token for storage (SHA-256, base64url).
pub fn hash_refresh_token(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    Base64UrlUnpadded::encode_string(&digest)
}
