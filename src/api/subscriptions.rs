// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Patros Labs

//! Creator tier and subscription endpoints.
//!
//! Payment settles against the subscription-manager contract on-chain; the
//! API only records the result, so every stored subscription carries status
//! `Done`. All writes in this module are refused with a 503 until a contract
//! address is configured, keeping the recording surface closed while nothing
//! on-chain can charge for it.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::auth::{Auth, CreatorOnly};
use crate::error::ApiError;
use crate::state::AppState;
use crate::storage::{
    IdentityRepository, NotificationKind, NotificationRepository, StoredSubscription, StoredTier,
    SubscriptionRepository,
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateTierRequest {
    pub name: Option<String>,
    /// Price in wei, matching what the contract charges
    pub price_wei: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateSubscriptionRequest {
    pub creator_user_id: Option<String>,
    /// Tier name purchased on-chain
    pub tier: Option<String>,
}

/// Create a subscription tier for the calling creator.
#[utoipa::path(
    post,
    path = "/v1/tiers",
    tag = "Subscriptions",
    request_body = CreateTierRequest,
    responses(
        (status = 201, description = "Tier created", body = StoredTier),
        (status = 400, description = "Missing name or price"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Caller is not a creator"),
        (status = 503, description = "No subscription contract configured")
    )
)]
pub async fn create_tier(
    CreatorOnly(user): CreatorOnly,
    State(state): State<AppState>,
    Json(body): Json<CreateTierRequest>,
) -> Result<(StatusCode, Json<StoredTier>), ApiError> {
    require_contract(&state)?;

    let name = body
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| ApiError::bad_request("Tier name is required"))?;
    let price_wei = body
        .price_wei
        .as_deref()
        .filter(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_digit()))
        .ok_or_else(|| ApiError::bad_request("price_wei must be a decimal wei amount"))?;

    let tier = SubscriptionRepository::new(&state.db).create_tier(&user.user_id, name, price_wei)?;
    Ok((StatusCode::CREATED, Json(tier)))
}

/// List a creator's tiers.
#[utoipa::path(
    get,
    path = "/v1/tiers/{creator_user_id}",
    tag = "Subscriptions",
    params(
        ("creator_user_id" = String, Path, description = "Creator's user identifier")
    ),
    responses(
        (status = 200, description = "Creator's tiers", body = Vec<StoredTier>),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "No such user")
    )
)]
pub async fn list_tiers(
    Auth(_user): Auth,
    State(state): State<AppState>,
    Path(creator_user_id): Path<String>,
) -> Result<Json<Vec<StoredTier>>, ApiError> {
    IdentityRepository::new(&state.db).get_user(&creator_user_id)?;
    let tiers = SubscriptionRepository::new(&state.db).list_tiers(&creator_user_id)?;
    Ok(Json(tiers))
}

/// Record a subscription to a creator's tier.
///
/// No payment verification happens here — the on-chain purchase already
/// settled — so the stored status is always `Done`, whatever the payload
/// says. The creator gets a `new_subscriber` notification.
#[utoipa::path(
    post,
    path = "/v1/subscriptions",
    tag = "Subscriptions",
    request_body = CreateSubscriptionRequest,
    responses(
        (status = 201, description = "Subscription recorded", body = StoredSubscription),
        (status = 400, description = "Missing creator or tier"),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "No such creator"),
        (status = 503, description = "No subscription contract configured")
    )
)]
pub async fn create_subscription(
    Auth(user): Auth,
    State(state): State<AppState>,
    Json(body): Json<CreateSubscriptionRequest>,
) -> Result<(StatusCode, Json<StoredSubscription>), ApiError> {
    require_contract(&state)?;

    let creator = body
        .creator_user_id
        .filter(|c| !c.is_empty())
        .ok_or_else(|| ApiError::bad_request("creator_user_id is required"))?;
    let tier = body
        .tier
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::bad_request("tier is required"))?;

    if creator == user.user_id {
        return Err(ApiError::bad_request("Cannot subscribe to yourself"));
    }
    IdentityRepository::new(&state.db).get_user(&creator)?;

    let subscription =
        SubscriptionRepository::new(&state.db).record(&creator, &user.user_id, &tier)?;

    if let Err(e) = NotificationRepository::new(&state.db).push(
        &creator,
        NotificationKind::NewSubscriber,
        &format!("New subscriber on tier {tier}"),
    ) {
        tracing::warn!(error = %e, %creator, "Failed to push subscriber notification");
    }

    Ok((StatusCode::CREATED, Json(subscription)))
}

/// The caller's subscriptions.
#[utoipa::path(
    get,
    path = "/v1/subscriptions",
    tag = "Subscriptions",
    responses(
        (status = 200, description = "Caller's subscriptions", body = Vec<StoredSubscription>),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn list_own_subscriptions(
    Auth(user): Auth,
    State(state): State<AppState>,
) -> Result<Json<Vec<StoredSubscription>>, ApiError> {
    let subs = SubscriptionRepository::new(&state.db).list_by_subscriber(&user.user_id)?;
    Ok(Json(subs))
}

/// Subscribers to the calling creator.
#[utoipa::path(
    get,
    path = "/v1/subscriptions/creator",
    tag = "Subscriptions",
    responses(
        (status = 200, description = "Subscriptions to the caller", body = Vec<StoredSubscription>),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Caller is not a creator")
    )
)]
pub async fn list_subscribers(
    CreatorOnly(user): CreatorOnly,
    State(state): State<AppState>,
) -> Result<Json<Vec<StoredSubscription>>, ApiError> {
    let subs = SubscriptionRepository::new(&state.db).list_by_creator(&user.user_id)?;
    Ok(Json(subs))
}

fn require_contract(state: &AppState) -> Result<(), ApiError> {
    if state.subscription_manager.is_none() {
        return Err(ApiError::unavailable(
            "Subscriptions are disabled: no subscription-manager contract configured",
        ));
    }
    Ok(())
}
