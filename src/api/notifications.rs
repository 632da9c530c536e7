// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Patros Labs

//! Notification feed endpoints.

use axum::{
    extract::{Path, State},
    Json,
};

use crate::auth::Auth;
use crate::error::ApiError;
use crate::state::AppState;
use crate::storage::{NotificationRepository, StoredNotification};

/// The caller's notification feed, newest first.
#[utoipa::path(
    get,
    path = "/v1/notifications",
    tag = "Notifications",
    responses(
        (status = 200, description = "Feed, newest first", body = Vec<StoredNotification>),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn list_notifications(
    Auth(user): Auth,
    State(state): State<AppState>,
) -> Result<Json<Vec<StoredNotification>>, ApiError> {
    let feed = NotificationRepository::new(&state.db).list_for_user(&user.user_id)?;
    Ok(Json(feed))
}

/// Mark one of the caller's notifications read. Idempotent.
#[utoipa::path(
    put,
    path = "/v1/notifications/{notification_id}/read",
    tag = "Notifications",
    params(
        ("notification_id" = String, Path, description = "Notification identifier")
    ),
    responses(
        (status = 200, description = "Notification marked read", body = StoredNotification),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Not in the caller's feed")
    )
)]
pub async fn mark_notification_read(
    Auth(user): Auth,
    State(state): State<AppState>,
    Path(notification_id): Path<String>,
) -> Result<Json<StoredNotification>, ApiError> {
    let updated =
        NotificationRepository::new(&state.db).mark_read(&user.user_id, &notification_id)?;
    Ok(Json(updated))
}
