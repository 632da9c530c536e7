// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Patros Labs

//! Profile endpoints.

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::Auth;
use crate::error::ApiError;
use crate::models::Gender;
use crate::state::AppState;
use crate::storage::{IdentityRepository, StoredPhoto, StoredUser};

/// Public profile shape. Address status and internal ids stay server-side.
#[derive(Debug, Serialize, ToSchema)]
pub struct ProfileResponse {
    pub user_id: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub birth_year: Option<i32>,
    pub country: Option<String>,
    pub gender: Option<Gender>,
    pub bio: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<StoredUser> for ProfileResponse {
    fn from(user: StoredUser) -> Self {
        Self {
            user_id: user.user_id,
            first_name: user.first_name,
            last_name: user.last_name,
            birth_year: user.birth_year,
            country: user.country,
            gender: user.gender,
            bio: user.bio,
            created_at: user.created_at,
        }
    }
}

/// Own profile, photos included.
#[derive(Debug, Serialize, ToSchema)]
pub struct OwnProfileResponse {
    #[serde(flatten)]
    pub profile: ProfileResponse,
    pub photos: Vec<StoredPhoto>,
}

/// Deserialize a present field into `Some(inner)`, so a JSON `null` clears
/// the stored value while an omitted field leaves it unchanged.
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: serde::Deserialize<'de>,
    D: serde::Deserializer<'de>,
{
    serde::Deserialize::deserialize(deserializer).map(Some)
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateProfileRequest {
    #[serde(default, deserialize_with = "double_option")]
    pub first_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub last_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub birth_year: Option<Option<i32>>,
    #[serde(default, deserialize_with = "double_option")]
    pub country: Option<Option<String>>,
    /// `"L"`, `"P"`, or `null` to clear; anything else is a 400
    #[serde(default, deserialize_with = "double_option")]
    pub gender: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub bio: Option<Option<String>>,
}

/// List all user profiles.
#[utoipa::path(
    get,
    path = "/v1/users",
    tag = "Users",
    responses(
        (status = 200, description = "User directory", body = Vec<ProfileResponse>),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn list_users(
    Auth(_user): Auth,
    State(state): State<AppState>,
) -> Result<Json<Vec<ProfileResponse>>, ApiError> {
    let users = IdentityRepository::new(&state.db).list_users()?;
    Ok(Json(users.into_iter().map(ProfileResponse::from).collect()))
}

/// The caller's own profile.
#[utoipa::path(
    get,
    path = "/v1/users/me",
    tag = "Users",
    responses(
        (status = 200, description = "Own profile with photos", body = OwnProfileResponse),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn get_own_profile(
    Auth(user): Auth,
    State(state): State<AppState>,
) -> Result<Json<OwnProfileResponse>, ApiError> {
    let identity = IdentityRepository::new(&state.db);
    let stored = identity.get_user(&user.user_id)?;
    let photos = identity.list_photos(&user.address_id)?;
    Ok(Json(OwnProfileResponse {
        profile: stored.into(),
        photos,
    }))
}

/// Update the caller's profile fields.
///
/// Only fields present in the request change: a JSON `null` clears a field,
/// an omitted field keeps its stored value.
#[utoipa::path(
    put,
    path = "/v1/users/me",
    tag = "Users",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Updated profile", body = ProfileResponse),
        (status = 400, description = "Invalid gender value"),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn update_own_profile(
    Auth(user): Auth,
    State(state): State<AppState>,
    Json(body): Json<UpdateProfileRequest>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let gender = match &body.gender {
        None => None,
        Some(None) => Some(None),
        Some(Some(code)) => match code.as_str() {
            "L" => Some(Some(Gender::Male)),
            "P" => Some(Some(Gender::Female)),
            other => {
                return Err(ApiError::bad_request(format!(
                    "Invalid gender '{other}': expected 'L' or 'P'"
                )))
            }
        },
    };

    let identity = IdentityRepository::new(&state.db);
    let mut stored = identity.get_user(&user.user_id)?;

    if let Some(value) = body.first_name {
        stored.first_name = value;
    }
    if let Some(value) = body.last_name {
        stored.last_name = value;
    }
    if let Some(value) = body.birth_year {
        stored.birth_year = value;
    }
    if let Some(value) = body.country {
        stored.country = value;
    }
    if let Some(value) = gender {
        stored.gender = value;
    }
    if let Some(value) = body.bio {
        stored.bio = value;
    }

    identity.update_user(&stored)?;
    Ok(Json(stored.into()))
}

/// A user's public profile by id.
#[utoipa::path(
    get,
    path = "/v1/users/{user_id}",
    tag = "Users",
    params(
        ("user_id" = String, Path, description = "User identifier")
    ),
    responses(
        (status = 200, description = "Public profile", body = ProfileResponse),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "No such user")
    )
)]
pub async fn get_user(
    Auth(_user): Auth,
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let stored = IdentityRepository::new(&state.db).get_user(&user_id)?;
    Ok(Json(stored.into()))
}
