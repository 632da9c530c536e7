// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Patros Labs

//! Axum extractors for authenticated users.
//!
//! Use the `Auth` extractor in handlers to require authentication:
//!
//! ```rust,ignore
//! async fn my_handler(Auth(user): Auth) -> impl IntoResponse {
//!     // user is AuthenticatedUser
//! }
//! ```
//!
//! Credentials are accepted from either an `Authorization: Bearer <token>`
//! header (API clients) or a `session=<token>` cookie (browsers).

use axum::{
    extract::FromRequestParts,
    http::{
        header::{AUTHORIZATION, COOKIE},
        request::Parts,
    },
};

use super::{AuthError, AuthenticatedUser, Role};
use crate::state::AppState;

/// Name of the browser session cookie.
pub const SESSION_COOKIE: &str = "session";

/// Extractor for authenticated users.
///
/// Verifies the session token and provides the authenticated user. Checks
/// request extensions first so middleware can pre-authenticate, then the
/// Authorization header, then the session cookie.
pub struct Auth(pub AuthenticatedUser);

impl FromRequestParts<AppState> for Auth {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        // Middleware may have already resolved the user
        if let Some(user) = parts.extensions.get::<AuthenticatedUser>().cloned() {
            return Ok(Auth(user));
        }

        let token = bearer_token(parts)?.or_else(|| session_cookie(parts));
        let token = token.ok_or(AuthError::MissingCredentials)?;

        let claims = state.session_keys.verify(&token)?;
        Ok(Auth(AuthenticatedUser::from(claims)))
    }
}

/// Pull a token out of the Authorization header, if present.
///
/// A present-but-malformed header is an error rather than a silent fallback
/// to the cookie: the client clearly intended bearer auth.
fn bearer_token(parts: &Parts) -> Result<Option<String>, AuthError> {
    let Some(value) = parts.headers.get(AUTHORIZATION) else {
        return Ok(None);
    };
    let value = value.to_str().map_err(|_| AuthError::InvalidAuthHeader)?;
    let token = value
        .strip_prefix("Bearer ")
        .ok_or(AuthError::InvalidAuthHeader)?;
    Ok(Some(token.to_string()))
}

/// Pull the session token out of the Cookie header, if present.
fn session_cookie(parts: &Parts) -> Option<String> {
    let header = parts.headers.get(COOKIE)?.to_str().ok()?;
    header.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        (name == SESSION_COOKIE).then(|| value.to_string())
    })
}

/// Extractor that requires the creator role (or higher).
pub struct CreatorOnly(pub AuthenticatedUser);

impl FromRequestParts<AppState> for CreatorOnly {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Auth(user) = Auth::from_request_parts(parts, state).await?;

        if !user.role.has_privilege(Role::Creator) {
            return Err(AuthError::InsufficientPermissions);
        }

        Ok(CreatorOnly(user))
    }
}

/// Extractor that requires the admin role.
pub struct AdminOnly(pub AuthenticatedUser);

impl FromRequestParts<AppState> for AdminOnly {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Auth(user) = Auth::from_request_parts(parts, state).await?;

        if user.role != Role::Admin {
            return Err(AuthError::InsufficientPermissions);
        }

        Ok(AdminOnly(user))
    }
}
