// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Patros Labs

//! Admin endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::auth::{AdminOnly, Role};
use crate::error::ApiError;
use crate::state::AppState;
use crate::storage::{AddressStatus, IdentityRepository, StoredAddress, StoredRole};

/// Delete an address and everything attached to it.
///
/// The cascade (user, role, photos, unique address index) runs in one
/// storage transaction; the chain address becomes free to re-register.
#[utoipa::path(
    delete,
    path = "/v1/admin/addresses/{address_id}",
    tag = "Admin",
    params(
        ("address_id" = String, Path, description = "Address identifier")
    ),
    responses(
        (status = 204, description = "Address and dependents deleted"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Caller is not an admin"),
        (status = 404, description = "No such address")
    )
)]
pub async fn delete_address(
    AdminOnly(admin): AdminOnly,
    State(state): State<AppState>,
    Path(address_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    IdentityRepository::new(&state.db).delete_address_cascade(&address_id)?;
    tracing::info!(admin = %admin.user_id, %address_id, "Address deleted by admin");
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SetRoleRequest {
    /// One of `admin`, `creator`, `member`
    pub role: Option<String>,
}

/// Change the role of an address.
///
/// Takes effect on the next sign-in or refresh; outstanding session tokens
/// keep their old role until they expire.
#[utoipa::path(
    put,
    path = "/v1/admin/addresses/{address_id}/role",
    tag = "Admin",
    params(
        ("address_id" = String, Path, description = "Address identifier")
    ),
    request_body = SetRoleRequest,
    responses(
        (status = 200, description = "Role updated", body = StoredRole),
        (status = 400, description = "Unknown role name"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Caller is not an admin"),
        (status = 404, description = "No such address")
    )
)]
pub async fn set_role(
    AdminOnly(admin): AdminOnly,
    State(state): State<AppState>,
    Path(address_id): Path<String>,
    Json(body): Json<SetRoleRequest>,
) -> Result<Json<StoredRole>, ApiError> {
    let role = body
        .role
        .as_deref()
        .and_then(Role::from_str)
        .ok_or_else(|| ApiError::bad_request("role must be one of admin, creator, member"))?;

    let updated = IdentityRepository::new(&state.db).set_role(&address_id, role)?;
    tracing::info!(admin = %admin.user_id, %address_id, %role, "Role changed by admin");
    Ok(Json(updated))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SetStatusRequest {
    /// `active` or `disabled`
    pub status: Option<String>,
}

/// Enable or disable an address.
///
/// A disabled address is refused at sign-in and refresh with a 403.
/// Outstanding session tokens keep working until they expire; there is no
/// per-request storage lookup to revoke them early.
#[utoipa::path(
    put,
    path = "/v1/admin/addresses/{address_id}/status",
    tag = "Admin",
    params(
        ("address_id" = String, Path, description = "Address identifier")
    ),
    request_body = SetStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = StoredAddress),
        (status = 400, description = "Unknown status name"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Caller is not an admin"),
        (status = 404, description = "No such address")
    )
)]
pub async fn set_status(
    AdminOnly(admin): AdminOnly,
    State(state): State<AppState>,
    Path(address_id): Path<String>,
    Json(body): Json<SetStatusRequest>,
) -> Result<Json<StoredAddress>, ApiError> {
    let status = match body.status.as_deref().map(str::to_lowercase).as_deref() {
        Some("active") => AddressStatus::Active,
        Some("disabled") => AddressStatus::Disabled,
        _ => return Err(ApiError::bad_request("status must be active or disabled")),
    };

    let updated = IdentityRepository::new(&state.db).set_status(&address_id, status)?;
    tracing::info!(admin = %admin.user_id, %address_id, ?status, "Address status changed by admin");
    Ok(Json(updated))
}
