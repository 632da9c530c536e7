// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Patros Labs

//! Wallet-signature authentication.
//!
//! Sign-in is a two-step challenge flow:
//!
//! 1. The wallet requests a nonce for its address and receives the exact
//!    challenge message to sign ([`nonce`]).
//! 2. The wallet signs the challenge with `personal_sign` and submits the
//!    signature; the server recovers the signer and compares it against the
//!    claimed address ([`signature`]).
//!
//! A successful verification mints an HMAC-signed session token (short
//! lived, stateless) and a refresh token (long lived, stored hashed and
//! rotated on every use) — see [`session`]. Handlers require authentication
//! through the extractors in [`extractor`].

mod error;
mod extractor;
mod nonce;
mod roles;
mod session;
mod signature;

pub use error::AuthError;
pub use extractor::{AdminOnly, Auth, CreatorOnly, SESSION_COOKIE};
pub use nonce::{challenge_message, NonceManager};
pub use roles::Role;
pub use session::{
    generate_refresh_token, hash_refresh_token, SessionClaims, SessionKeys, REFRESH_TTL,
    SESSION_TTL,
};
pub use signature::verify_personal_sign;

use crate::models::ChainAddress;

/// An authenticated user, resolved from a verified session token.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: String,
    pub address_id: String,
    pub address: ChainAddress,
    pub role: Role,
    /// Unix timestamp (seconds) when the session expires
    pub expires_at: i64,
}

impl From<SessionClaims> for AuthenticatedUser {
    fn from(claims: SessionClaims) -> Self {
        Self {
            user_id: claims.user_id,
            address_id: claims.address_id,
            address: claims.address,
            role: claims.role,
            expires_at: claims.expires_at,
        }
    }
}
