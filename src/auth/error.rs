// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Patros Labs

//! Authentication errors.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Authentication error type.
///
/// Covers the whole wallet session flow: nonce issuance, signature
/// verification, session token checks, and refresh token rotation.
#[derive(Debug)]
pub enum AuthError {
    /// No bearer token and no session cookie present
    MissingCredentials,
    /// Authorization header or cookie is not parseable
    InvalidAuthHeader,
    /// Address string is not a valid EVM address
    InvalidAddress,
    /// No nonce was issued for this address, or it was already used
    UnknownNonce,
    /// The issued nonce expired before the signature arrived
    NonceExpired,
    /// Signature bytes are not a valid 65-byte ECDSA signature
    MalformedSignature,
    /// Signature recovers to a different address than claimed
    SignatureMismatch,
    /// Session token failed HMAC verification or is structurally invalid
    InvalidSessionToken,
    /// Session token has expired
    SessionExpired,
    /// Refresh token is unknown, expired, or revoked
    InvalidRefreshToken,
    /// Address is disabled and may not sign in
    AddressDisabled,
    /// Insufficient permissions
    InsufficientPermissions,
    /// Internal error
    InternalError(String),
}

#[derive(Serialize)]
struct AuthErrorBody {
    error: String,
    error_code: String,
}

impl AuthError {
    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::MissingCredentials => "missing_credentials",
            AuthError::InvalidAuthHeader => "invalid_auth_header",
            AuthError::InvalidAddress => "invalid_address",
            AuthError::UnknownNonce => "unknown_nonce",
            AuthError::NonceExpired => "nonce_expired",
            AuthError::MalformedSignature => "malformed_signature",
            AuthError::SignatureMismatch => "signature_mismatch",
            AuthError::InvalidSessionToken => "invalid_session_token",
            AuthError::SessionExpired => "session_expired",
            AuthError::InvalidRefreshToken => "invalid_refresh_token",
            AuthError::AddressDisabled => "address_disabled",
            AuthError::InsufficientPermissions => "insufficient_permissions",
            AuthError::InternalError(_) => "internal_error",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::MissingCredentials
            | AuthError::InvalidAuthHeader
            | AuthError::UnknownNonce
            | AuthError::NonceExpired
            | AuthError::MalformedSignature
            | AuthError::SignatureMismatch
            | AuthError::InvalidSessionToken
            | AuthError::SessionExpired
            | AuthError::InvalidRefreshToken => StatusCode::UNAUTHORIZED,
            AuthError::InvalidAddress => StatusCode::BAD_REQUEST,
            AuthError::AddressDisabled | AuthError::InsufficientPermissions => {
                StatusCode::FORBIDDEN
            }
            AuthError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::MissingCredentials => {
                write!(f, "Authentication required (bearer token or session cookie)")
            }
            AuthError::InvalidAuthHeader => {
                write!(f, "Invalid authorization header format (expected 'Bearer <token>')")
            }
            AuthError::InvalidAddress => write!(f, "Not a valid chain address"),
            AuthError::UnknownNonce => write!(f, "No active sign-in nonce for this address"),
            AuthError::NonceExpired => write!(f, "Sign-in nonce has expired"),
            AuthError::MalformedSignature => write!(f, "Signature is malformed"),
            AuthError::SignatureMismatch => {
                write!(f, "Signature does not recover the claimed address")
            }
            AuthError::InvalidSessionToken => write!(f, "Session token is invalid"),
            AuthError::SessionExpired => write!(f, "Session has expired"),
            AuthError::InvalidRefreshToken => write!(f, "Refresh token is invalid"),
            AuthError::AddressDisabled => write!(f, "This address is disabled"),
            AuthError::InsufficientPermissions => {
                write!(f, "Insufficient permissions for this operation")
            }
            AuthError::InternalError(msg) => write!(f, "Internal authentication error: {msg}"),
        }
    }
}

impl std::error::Error for AuthError {}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(AuthErrorBody {
            error: self.to_string(),
            error_code: self.error_code().to_string(),
        });
        (status, body).into_response()
    }
}
