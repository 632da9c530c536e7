// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Patros Labs

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    auth::Role,
    models::{ChainAddress, Gender},
    state::AppState,
    storage::{
        AddressStatus, ChatListEntry, StoredAddress, StoredGroupChat, StoredNotification,
        StoredPhoto, StoredRole, StoredSubscription, StoredTier,
    },
};

pub mod admin;
pub mod auth;
pub mod chats;
pub mod health;
pub mod notifications;
pub mod photos;
pub mod subscriptions;
pub mod users;

pub fn router(state: AppState) -> Router {
    let v1_routes = Router::new()
        .route("/auth/nonce", post(auth::request_nonce))
        .route("/auth/verify", post(auth::verify_signature))
        .route("/auth/refresh", post(auth::refresh_session))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/session", get(auth::session_info))
        .route("/users", get(users::list_users))
        .route(
            "/users/me",
            get(users::get_own_profile).put(users::update_own_profile),
        )
        .route("/users/{user_id}", get(users::get_user))
        .route("/photos", post(photos::add_photo))
        .route("/chats", get(chats::list_chats))
        .route("/chats/personal", post(chats::create_personal_chat))
        .route("/chats/group", post(chats::create_group_chat))
        .route(
            "/chats/{chat_id}/messages",
            get(chats::list_messages).post(chats::send_message),
        )
        .route("/tiers", post(subscriptions::create_tier))
        .route("/tiers/{creator_user_id}", get(subscriptions::list_tiers))
        .route(
            "/subscriptions",
            get(subscriptions::list_own_subscriptions).post(subscriptions::create_subscription),
        )
        .route("/subscriptions/creator", get(subscriptions::list_subscribers))
        .route("/notifications", get(notifications::list_notifications))
        .route(
            "/notifications/{notification_id}/read",
            put(notifications::mark_notification_read),
        )
        .route("/admin/addresses/{address_id}", delete(admin::delete_address))
        .route("/admin/addresses/{address_id}/role", put(admin::set_role))
        .route("/admin/addresses/{address_id}/status", put(admin::set_status))
        .with_state(state.clone());

    let health_routes = Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .with_state(state);

    Router::new()
        .nest("/v1", v1_routes)
        .merge(health_routes)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::request_nonce,
        auth::verify_signature,
        auth::refresh_session,
        auth::logout,
        auth::session_info,
        users::list_users,
        users::get_own_profile,
        users::update_own_profile,
        users::get_user,
        photos::add_photo,
        chats::create_personal_chat,
        chats::list_chats,
        chats::create_group_chat,
        chats::send_message,
        chats::list_messages,
        subscriptions::create_tier,
        subscriptions::list_tiers,
        subscriptions::create_subscription,
        subscriptions::list_own_subscriptions,
        subscriptions::list_subscribers,
        notifications::list_notifications,
        notifications::mark_notification_read,
        admin::delete_address,
        admin::set_role,
        admin::set_status,
        health::health,
        health::liveness,
        health::readiness
    ),
    components(
        schemas(
            ChainAddress,
            Gender,
            Role,
            StoredRole,
            AddressStatus,
            StoredAddress,
            ChatListEntry,
            StoredGroupChat,
            StoredNotification,
            StoredPhoto,
            StoredSubscription,
            StoredTier,
            auth::NonceRequest,
            auth::NonceResponse,
            auth::VerifyRequest,
            auth::SessionResponse,
            auth::RefreshRequest,
            auth::LogoutRequest,
            auth::SessionInfoResponse,
            users::ProfileResponse,
            users::OwnProfileResponse,
            users::UpdateProfileRequest,
            photos::AddPhotoRequest,
            chats::CreatePersonalChatRequest,
            chats::PersonalChatResponse,
            chats::CreateGroupChatRequest,
            chats::SendMessageRequest,
            chats::MessageResponse,
            subscriptions::CreateTierRequest,
            subscriptions::CreateSubscriptionRequest,
            admin::SetRoleRequest,
            admin::SetStatusRequest,
            health::ReadyResponse,
            health::HealthChecks,
            health::HealthResponse
        )
    ),
    tags(
        (name = "Auth", description = "Wallet sign-in and sessions"),
        (name = "Users", description = "Profiles and photos"),
        (name = "Chats", description = "Personal and group chat relay"),
        (name = "Subscriptions", description = "Creator tiers and subscriptions"),
        (name = "Notifications", description = "Per-user notification feeds"),
        (name = "Admin", description = "Administrative operations"),
        (name = "Health", description = "Probes")
    )
)]
struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{Role, SessionClaims, SessionKeys};
    use crate::storage::{IdentityRepository, PlatformDb, SubscriptionRepository};
    use alloy::primitives::Address;
    use alloy::signers::{local::PrivateKeySigner, SignerSync};
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use chrono::Utc;
    use tempfile::TempDir;
    use tower::ServiceExt;

    fn test_state() -> (AppState, TempDir) {
        let dir = TempDir::new().unwrap();
        let db = PlatformDb::open(dir.path().join("test.redb")).unwrap();
        let state = AppState::new(db, SessionKeys::new(b"router-test-secret".to_vec()));
        (state, dir)
    }

    /// Register an identity and mint a bearer token for it.
    fn signed_in_user(state: &AppState, n: u8, role: Role) -> (String, String) {
        let address =
            ChainAddress::parse(&format!("0x{:040x}", n as u64 + 0xa000)).unwrap();
        let identity = IdentityRepository::new(&state.db)
            .register(&address, role)
            .unwrap();
        let claims = SessionClaims::new(
            identity.user.user_id.clone(),
            identity.address.address_id.clone(),
            address,
            role,
            Utc::now(),
        );
        let token = state.session_keys.sign(&claims).unwrap();
        (identity.user.user_id, token)
    }

    async fn send(
        app: Router,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<serde_json::Value>,
    ) -> (StatusCode, serde_json::Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    /// Run the full nonce/sign/verify handshake for a wallet key.
    async fn wallet_verify(
        state: &AppState,
        signer: &PrivateKeySigner,
    ) -> (StatusCode, serde_json::Value) {
        let address = signer.address().to_string();
        let (status, nonce_body) = send(
            router(state.clone()),
            "POST",
            "/v1/auth/nonce",
            None,
            Some(serde_json::json!({ "address": address })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let message = nonce_body["message"].as_str().unwrap();

        let signature = signer.sign_message_sync(message.as_bytes()).unwrap();
        send(
            router(state.clone()),
            "POST",
            "/v1/auth/verify",
            None,
            Some(serde_json::json!({
                "address": address,
                "signature": alloy::hex::encode_prefixed(signature.as_bytes()),
            })),
        )
        .await
    }

    #[tokio::test]
    async fn router_builds_with_all_routes() {
        let (state, _dir) = test_state();
        let app = router(state);
        let _ = app.into_make_service();
    }

    #[tokio::test]
    async fn gated_endpoints_reject_missing_credentials() {
        let (state, _dir) = test_state();

        for uri in ["/v1/users", "/v1/chats", "/v1/notifications", "/v1/subscriptions"] {
            let app = router(state.clone());
            let (status, body) = send(app, "GET", uri, None, None).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri}");
            assert_eq!(body["error_code"], "missing_credentials", "{uri}");
        }
    }

    #[tokio::test]
    async fn personal_chat_creation_is_idempotent_per_pair() {
        let (state, _dir) = test_state();
        let (alice_id, alice_token) = signed_in_user(&state, 1, Role::Member);
        let (bob_id, bob_token) = signed_in_user(&state, 2, Role::Member);

        let (status, first) = send(
            router(state.clone()),
            "POST",
            "/v1/chats/personal",
            Some(&alice_token),
            Some(serde_json::json!({ "peer_user_id": bob_id })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(first["created"], true);

        // Same pair from the other side returns the same chat
        let (status, second) = send(
            router(state.clone()),
            "POST",
            "/v1/chats/personal",
            Some(&bob_token),
            Some(serde_json::json!({ "peer_user_id": alice_id })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(second["created"], false);
        assert_eq!(second["chat_id"], first["chat_id"]);
    }

    #[tokio::test]
    async fn chat_with_self_is_rejected() {
        let (state, _dir) = test_state();
        let (alice_id, alice_token) = signed_in_user(&state, 3, Role::Member);

        let (status, _) = send(
            router(state),
            "POST",
            "/v1/chats/personal",
            Some(&alice_token),
            Some(serde_json::json!({ "peer_user_id": alice_id })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn missing_message_field_is_400_and_inserts_nothing() {
        let (state, _dir) = test_state();
        let (_alice, alice_token) = signed_in_user(&state, 4, Role::Member);
        let (bob_id, _) = signed_in_user(&state, 5, Role::Member);

        let (status, chat) = send(
            router(state.clone()),
            "POST",
            "/v1/chats/personal",
            Some(&alice_token),
            Some(serde_json::json!({ "peer_user_id": bob_id })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let chat_id = chat["chat_id"].as_str().unwrap();

        let (status, _) = send(
            router(state.clone()),
            "POST",
            &format!("/v1/chats/{chat_id}/messages"),
            Some(&alice_token),
            Some(serde_json::json!({})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, messages) = send(
            router(state.clone()),
            "GET",
            &format!("/v1/chats/{chat_id}/messages"),
            Some(&alice_token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(messages.as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn non_participant_cannot_read_messages() {
        let (state, _dir) = test_state();
        let (_alice, alice_token) = signed_in_user(&state, 6, Role::Member);
        let (bob_id, _) = signed_in_user(&state, 7, Role::Member);
        let (_eve, eve_token) = signed_in_user(&state, 8, Role::Member);

        let (_, chat) = send(
            router(state.clone()),
            "POST",
            "/v1/chats/personal",
            Some(&alice_token),
            Some(serde_json::json!({ "peer_user_id": bob_id })),
        )
        .await;
        let chat_id = chat["chat_id"].as_str().unwrap();

        let (status, _) = send(
            router(state.clone()),
            "GET",
            &format!("/v1/chats/{chat_id}/messages"),
            Some(&eve_token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn subscription_writes_need_a_configured_contract() {
        let (state, _dir) = test_state();
        let (creator_id, _) = signed_in_user(&state, 9, Role::Creator);
        let (_fan, fan_token) = signed_in_user(&state, 10, Role::Member);

        // No contract configured: 503
        let (status, _) = send(
            router(state.clone()),
            "POST",
            "/v1/subscriptions",
            Some(&fan_token),
            Some(serde_json::json!({ "creator_user_id": creator_id, "tier": "gold" })),
        )
        .await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn recorded_subscription_status_is_always_done() {
        let (state, _dir) = test_state();
        let state = state.with_subscription_manager(Some(Address::ZERO));
        let (creator_id, _) = signed_in_user(&state, 11, Role::Creator);
        let (_fan, fan_token) = signed_in_user(&state, 12, Role::Member);

        // The payload claims a different status; it is ignored
        let (status, sub) = send(
            router(state.clone()),
            "POST",
            "/v1/subscriptions",
            Some(&fan_token),
            Some(serde_json::json!({
                "creator_user_id": creator_id,
                "tier": "gold",
                "status": "Pending"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(sub["status"], "Done");

        let stored = SubscriptionRepository::new(&state.db)
            .list_by_creator(&creator_id)
            .unwrap();
        assert_eq!(stored.len(), 1);
    }

    #[tokio::test]
    async fn tier_creation_is_creator_only() {
        let (state, _dir) = test_state();
        let state = state.with_subscription_manager(Some(Address::ZERO));
        let (_member, member_token) = signed_in_user(&state, 13, Role::Member);

        let (status, _) = send(
            router(state),
            "POST",
            "/v1/tiers",
            Some(&member_token),
            Some(serde_json::json!({ "name": "gold", "price_wei": "1000" })),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn verify_registers_new_wallet_and_issues_session() {
        let (state, _dir) = test_state();
        let signer = PrivateKeySigner::random();

        let (status, session) = wallet_verify(&state, &signer).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(session["role"], "member");
        let user_id = session["user_id"].as_str().unwrap().to_string();

        // The issued token authenticates real requests
        let token = session["session_token"].as_str().unwrap();
        let (status, profile) =
            send(router(state.clone()), "GET", "/v1/users/me", Some(token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(profile["user_id"], user_id.as_str());

        // Signing in again resolves to the same identity
        let (status, second) = wallet_verify(&state, &signer).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(second["user_id"], user_id.as_str());
    }

    #[tokio::test]
    async fn verify_sets_session_cookie() {
        let (state, _dir) = test_state();
        let signer = PrivateKeySigner::random();
        let address = signer.address().to_string();

        let (status, nonce_body) = send(
            router(state.clone()),
            "POST",
            "/v1/auth/nonce",
            None,
            Some(serde_json::json!({ "address": address })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let message = nonce_body["message"].as_str().unwrap();
        let signature = signer.sign_message_sync(message.as_bytes()).unwrap();

        let request = Request::builder()
            .method("POST")
            .uri("/v1/auth/verify")
            .header("content-type", "application/json")
            .body(Body::from(
                serde_json::json!({
                    "address": address,
                    "signature": alloy::hex::encode_prefixed(signature.as_bytes()),
                })
                .to_string(),
            ))
            .unwrap();
        let response = router(state).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let cookie = response
            .headers()
            .get("set-cookie")
            .and_then(|v| v.to_str().ok())
            .unwrap();
        assert!(cookie.starts_with("session="));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Secure"));
    }

    #[tokio::test]
    async fn verify_with_wrong_key_is_401_and_burns_nonce() {
        let (state, _dir) = test_state();
        let claimed = PrivateKeySigner::random();
        let impostor = PrivateKeySigner::random();
        let address = claimed.address().to_string();

        let (status, nonce_body) = send(
            router(state.clone()),
            "POST",
            "/v1/auth/nonce",
            None,
            Some(serde_json::json!({ "address": address })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let message = nonce_body["message"].as_str().unwrap().to_string();

        let forged = impostor.sign_message_sync(message.as_bytes()).unwrap();
        let (status, body) = send(
            router(state.clone()),
            "POST",
            "/v1/auth/verify",
            None,
            Some(serde_json::json!({
                "address": address,
                "signature": alloy::hex::encode_prefixed(forged.as_bytes()),
            })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error_code"], "signature_mismatch");

        // The failed attempt consumed the nonce; a correct signature over the
        // same challenge no longer works
        let genuine = claimed.sign_message_sync(message.as_bytes()).unwrap();
        let (status, body) = send(
            router(state.clone()),
            "POST",
            "/v1/auth/verify",
            None,
            Some(serde_json::json!({
                "address": address,
                "signature": alloy::hex::encode_prefixed(genuine.as_bytes()),
            })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error_code"], "unknown_nonce");
    }

    #[tokio::test]
    async fn refresh_rotates_and_rejects_replay() {
        let (state, _dir) = test_state();
        let signer = PrivateKeySigner::random();

        let (status, session) = wallet_verify(&state, &signer).await;
        assert_eq!(status, StatusCode::OK);
        let original = session["refresh_token"].as_str().unwrap().to_string();

        let (status, rotated) = send(
            router(state.clone()),
            "POST",
            "/v1/auth/refresh",
            None,
            Some(serde_json::json!({ "refresh_token": original })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let successor = rotated["refresh_token"].as_str().unwrap().to_string();
        assert_ne!(successor, original);

        // Replaying the rotated-out token fails
        let (status, body) = send(
            router(state.clone()),
            "POST",
            "/v1/auth/refresh",
            None,
            Some(serde_json::json!({ "refresh_token": original })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error_code"], "invalid_refresh_token");

        // The successor still works
        let (status, _) = send(
            router(state.clone()),
            "POST",
            "/v1/auth/refresh",
            None,
            Some(serde_json::json!({ "refresh_token": successor })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn disabled_address_cannot_sign_in_or_refresh() {
        let (state, _dir) = test_state();
        let signer = PrivateKeySigner::random();

        let (status, session) = wallet_verify(&state, &signer).await;
        assert_eq!(status, StatusCode::OK);
        let refresh_token = session["refresh_token"].as_str().unwrap().to_string();

        let wallet = ChainAddress::parse(&signer.address().to_string()).unwrap();
        let address_id = IdentityRepository::new(&state.db)
            .find_address_id(&wallet)
            .unwrap()
            .unwrap();

        let (_admin, admin_token) = signed_in_user(&state, 20, Role::Admin);
        let (status, body) = send(
            router(state.clone()),
            "PUT",
            &format!("/v1/admin/addresses/{address_id}/status"),
            Some(&admin_token),
            Some(serde_json::json!({ "status": "disabled" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "disabled");

        // A fresh, correctly signed challenge is refused
        let (status, body) = wallet_verify(&state, &signer).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error_code"], "address_disabled");

        // So is rotating the refresh token issued before the disable
        let (status, body) = send(
            router(state.clone()),
            "POST",
            "/v1/auth/refresh",
            None,
            Some(serde_json::json!({ "refresh_token": refresh_token })),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error_code"], "address_disabled");
    }

    #[tokio::test]
    async fn profile_update_clears_nulled_fields_and_keeps_omitted_ones() {
        let (state, _dir) = test_state();
        let (_user, token) = signed_in_user(&state, 21, Role::Member);

        let (status, _) = send(
            router(state.clone()),
            "PUT",
            "/v1/users/me",
            Some(&token),
            Some(serde_json::json!({
                "first_name": "Ayu",
                "bio": "hello",
                "gender": "P"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        // A null clears the field; omitted fields keep their stored value
        let (status, profile) = send(
            router(state.clone()),
            "PUT",
            "/v1/users/me",
            Some(&token),
            Some(serde_json::json!({ "bio": null })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(profile["bio"].is_null());
        assert_eq!(profile["first_name"], "Ayu");
        assert_eq!(profile["gender"], "P");

        let (status, _) = send(
            router(state.clone()),
            "PUT",
            "/v1/users/me",
            Some(&token),
            Some(serde_json::json!({ "gender": "X" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn health_endpoints_respond() {
        let (state, _dir) = test_state();

        let (status, body) = send(router(state.clone()), "GET", "/health/live", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");

        let (status, body) = send(router(state), "GET", "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["checks"]["database"], "ok");
    }
}
