// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Patros Labs

//! Wallet sign-in endpoints.
//!
//! The nonce/verify pair implements the challenge flow described in
//! [`crate::auth`]: a wallet requests a nonce, signs the challenge message,
//! and trades the signature for a session token and a refresh token. An
//! address never seen before is registered on the spot with a blank profile
//! and the `member` role.

use axum::{
    extract::State,
    http::header::SET_COOKIE,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::{
    challenge_message, generate_refresh_token, hash_refresh_token, verify_personal_sign, Auth,
    AuthError, Role, SessionClaims, SESSION_COOKIE, REFRESH_TTL, SESSION_TTL,
};
use crate::config;
use crate::models::ChainAddress;
use crate::state::AppState;
use crate::storage::{
    AddressStatus, IdentityRepository, RefreshTokenRepository, StorageError, StoredRefreshToken,
    StoredUser,
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct NonceRequest {
    /// Chain address requesting a sign-in challenge
    pub address: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct NonceResponse {
    /// Checksummed form of the requesting address
    pub address: ChainAddress,
    /// Single-use nonce embedded in the challenge
    pub nonce: String,
    /// Exact message the wallet must sign (personal_sign payload)
    pub message: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct VerifyRequest {
    pub address: String,
    /// 0x-prefixed hex signature over the challenge message
    pub signature: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SessionResponse {
    pub session_token: String,
    pub refresh_token: String,
    pub user_id: String,
    pub address: ChainAddress,
    pub role: Role,
    /// Unix timestamp (seconds) when the session token expires
    pub expires_at: i64,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Deserialize, Default, ToSchema)]
pub struct LogoutRequest {
    /// Refresh token to revoke, if the client still holds one
    #[serde(default)]
    pub refresh_token: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SessionInfoResponse {
    pub user_id: String,
    pub address_id: String,
    pub address: ChainAddress,
    pub role: Role,
    pub expires_at: i64,
}

/// Request a sign-in nonce for a wallet address.
#[utoipa::path(
    post,
    path = "/v1/auth/nonce",
    tag = "Auth",
    request_body = NonceRequest,
    responses(
        (status = 200, description = "Challenge issued", body = NonceResponse),
        (status = 400, description = "Not a valid chain address")
    )
)]
pub async fn request_nonce(
    State(state): State<AppState>,
    Json(body): Json<NonceRequest>,
) -> Result<Json<NonceResponse>, AuthError> {
    let address = ChainAddress::parse(&body.address).ok_or(AuthError::InvalidAddress)?;

    let nonce = state.nonces.write().await.issue(&address);
    let message = challenge_message(&address, &nonce);

    Ok(Json(NonceResponse {
        address,
        nonce,
        message,
    }))
}

/// Verify a signed challenge and establish a session.
///
/// Unknown addresses are registered on the fly (blank profile, `member`
/// role); disabled addresses are refused. The nonce is consumed whether or
/// not the signature checks out.
#[utoipa::path(
    post,
    path = "/v1/auth/verify",
    tag = "Auth",
    request_body = VerifyRequest,
    responses(
        (status = 200, description = "Session established", body = SessionResponse),
        (status = 400, description = "Not a valid chain address"),
        (status = 401, description = "Bad signature or no active nonce"),
        (status = 403, description = "Address is disabled")
    )
)]
pub async fn verify_signature(
    State(state): State<AppState>,
    Json(body): Json<VerifyRequest>,
) -> Result<impl IntoResponse, AuthError> {
    let address = ChainAddress::parse(&body.address).ok_or(AuthError::InvalidAddress)?;

    let nonce = state.nonces.write().await.consume(&address)?;
    let message = challenge_message(&address, &nonce);
    verify_personal_sign(&address, &message, &body.signature)?;

    let (user, role, address_id) = resolve_or_register(&state, &address)?;

    let claims = SessionClaims::new(
        user.user_id.clone(),
        address_id.clone(),
        address.clone(),
        role,
        Utc::now(),
    );
    let session_token = state.session_keys.sign(&claims)?;
    let refresh_token = issue_refresh_token(&state, &user.user_id, &address_id)?;

    tracing::info!(user_id = %user.user_id, %address, "Wallet session established");

    let response = SessionResponse {
        session_token: session_token.clone(),
        refresh_token,
        user_id: user.user_id,
        address,
        role,
        expires_at: claims.expires_at,
    };
    Ok(([(SET_COOKIE, session_cookie(&session_token))], Json(response)))
}

/// Trade an unexpired refresh token for a fresh session.
///
/// Rotation is mandatory: the presented token is revoked and its successor's
/// hash recorded, so replaying it later fails.
#[utoipa::path(
    post,
    path = "/v1/auth/refresh",
    tag = "Auth",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "Session rotated", body = SessionResponse),
        (status = 401, description = "Refresh token unknown, expired, or revoked"),
        (status = 403, description = "Address is disabled")
    )
)]
pub async fn refresh_session(
    State(state): State<AppState>,
    Json(body): Json<RefreshRequest>,
) -> Result<impl IntoResponse, AuthError> {
    let tokens = RefreshTokenRepository::new(&state.db);
    let presented_hash = hash_refresh_token(&body.refresh_token);

    let stored = match tokens.get(&presented_hash) {
        Ok(stored) => stored,
        Err(StorageError::NotFound(_)) => return Err(AuthError::InvalidRefreshToken),
        Err(e) => return Err(AuthError::InternalError(e.to_string())),
    };
    if !stored.is_active(Utc::now()) {
        return Err(AuthError::InvalidRefreshToken);
    }

    // Re-read identity so disabling or promotion takes effect on rotation
    let identity = IdentityRepository::new(&state.db);
    let record = identity
        .get_address(&stored.address_id)
        .map_err(|_| AuthError::InvalidRefreshToken)?;
    if record.status == AddressStatus::Disabled {
        return Err(AuthError::AddressDisabled);
    }
    let role = identity
        .get_role(&stored.address_id)
        .map(|r| r.role)
        .map_err(|e| AuthError::InternalError(e.to_string()))?;

    let new_token = generate_refresh_token();
    let new_hash = hash_refresh_token(&new_token);
    let now = Utc::now();
    tokens
        .insert(&StoredRefreshToken {
            token_hash: new_hash.clone(),
            user_id: stored.user_id.clone(),
            address_id: stored.address_id.clone(),
            issued_at: now,
            expires_at: now + REFRESH_TTL,
            revoked_at: None,
            replaced_by: None,
        })
        .map_err(|e| AuthError::InternalError(e.to_string()))?;
    tokens
        .revoke(&presented_hash, Some(&new_hash))
        .map_err(|e| AuthError::InternalError(e.to_string()))?;

    let claims = SessionClaims::new(
        stored.user_id.clone(),
        stored.address_id.clone(),
        record.address.clone(),
        role,
        now,
    );
    let session_token = state.session_keys.sign(&claims)?;

    let response = SessionResponse {
        session_token: session_token.clone(),
        refresh_token: new_token,
        user_id: stored.user_id,
        address: record.address,
        role,
        expires_at: claims.expires_at,
    };
    Ok(([(SET_COOKIE, session_cookie(&session_token))], Json(response)))
}

/// End a session: revoke the presented refresh token and clear the cookie.
///
/// Deliberately lenient — an unknown or already-revoked token still gets a
/// 200, so a client can always log out.
#[utoipa::path(
    post,
    path = "/v1/auth/logout",
    tag = "Auth",
    request_body = LogoutRequest,
    responses(
        (status = 200, description = "Session ended")
    )
)]
pub async fn logout(
    State(state): State<AppState>,
    body: Option<Json<LogoutRequest>>,
) -> impl IntoResponse {
    if let Some(Json(LogoutRequest {
        refresh_token: Some(token),
    })) = body
    {
        let tokens = RefreshTokenRepository::new(&state.db);
        let hash = hash_refresh_token(&token);
        if let Err(e) = tokens.revoke(&hash, None) {
            tracing::debug!(error = %e, "Logout with unknown refresh token");
        }
    }

    (
        [(SET_COOKIE, clear_session_cookie())],
        Json(serde_json::json!({ "status": "logged_out" })),
    )
}

/// Echo the authenticated session's claims.
#[utoipa::path(
    get,
    path = "/v1/auth/session",
    tag = "Auth",
    responses(
        (status = 200, description = "Current session", body = SessionInfoResponse),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn session_info(Auth(user): Auth) -> Json<SessionInfoResponse> {
    Json(SessionInfoResponse {
        user_id: user.user_id,
        address_id: user.address_id,
        address: user.address,
        role: user.role,
        expires_at: user.expires_at,
    })
}

/// Look up the identity for an address, registering it if unseen.
fn resolve_or_register(
    state: &AppState,
    address: &ChainAddress,
) -> Result<(StoredUser, Role, String), AuthError> {
    let identity = IdentityRepository::new(&state.db);

    let address_id = identity
        .find_address_id(address)
        .map_err(|e| AuthError::InternalError(e.to_string()))?;

    match address_id {
        Some(address_id) => {
            let record = identity
                .get_address(&address_id)
                .map_err(|e| AuthError::InternalError(e.to_string()))?;
            if record.status == AddressStatus::Disabled {
                return Err(AuthError::AddressDisabled);
            }
            let user = identity
                .get_user_by_address(&address_id)
                .map_err(|e| AuthError::InternalError(e.to_string()))?;
            let role = identity
                .get_role(&address_id)
                .map(|r| r.role)
                .map_err(|e| AuthError::InternalError(e.to_string()))?;
            Ok((user, role, address_id))
        }
        None => {
            let registered = identity
                .register(address, Role::Member)
                .map_err(|e| AuthError::InternalError(e.to_string()))?;
            tracing::info!(%address, user_id = %registered.user.user_id, "Registered new address");
            let address_id = registered.address.address_id;
            Ok((registered.user, registered.role.role, address_id))
        }
    }
}

fn issue_refresh_token(
    state: &AppState,
    user_id: &str,
    address_id: &str,
) -> Result<String, AuthError> {
    let token = generate_refresh_token();
    let now = Utc::now();
    RefreshTokenRepository::new(&state.db)
        .insert(&StoredRefreshToken {
            token_hash: hash_refresh_token(&token),
            user_id: user_id.to_string(),
            address_id: address_id.to_string(),
            issued_at: now,
            expires_at: now + REFRESH_TTL,
            revoked_at: None,
            replaced_by: None,
        })
        .map_err(|e| AuthError::InternalError(e.to_string()))?;
    Ok(token)
}

fn session_cookie(token: &str) -> String {
    cookie_with_max_age(token, SESSION_TTL.num_seconds())
}

fn clear_session_cookie() -> String {
    cookie_with_max_age("", 0)
}

fn cookie_with_max_age(token: &str, max_age: i64) -> String {
    let secure = if config::secure_cookies() {
        "; Secure"
    } else {
        ""
    };
    format!("{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax{secure}; Max-Age={max_age}")
}
