// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Patros Labs

//! Profile photo endpoints.

use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::auth::Auth;
use crate::error::ApiError;
use crate::state::AppState;
use crate::storage::{IdentityRepository, StoredPhoto};

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddPhotoRequest {
    /// Path or URL of the uploaded image
    pub path: Option<String>,
}

/// Attach a profile photo to the caller's address.
#[utoipa::path(
    post,
    path = "/v1/photos",
    tag = "Users",
    request_body = AddPhotoRequest,
    responses(
        (status = 201, description = "Photo attached", body = StoredPhoto),
        (status = 400, description = "Missing photo path"),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn add_photo(
    Auth(user): Auth,
    State(state): State<AppState>,
    Json(body): Json<AddPhotoRequest>,
) -> Result<(StatusCode, Json<StoredPhoto>), ApiError> {
    let path = body
        .path
        .filter(|p| !p.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("Photo path is required"))?;

    let photo = IdentityRepository::new(&state.db).add_photo(&user.address_id, path)?;
    Ok((StatusCode::CREATED, Json(photo)))
}
