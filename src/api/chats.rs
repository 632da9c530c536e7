// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Patros Labs

//! Chat relay endpoints.
//!
//! The server stores and serves messages; there is no delivery tracking,
//! acknowledgment, or retry. Recipients learn about new messages through
//! their notification feed.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::Auth;
use crate::error::ApiError;
use crate::state::AppState;
use crate::storage::{
    ChatListEntry, ChatRepository, IdentityRepository, NotificationKind, NotificationRepository,
    StorageError, StoredGroupChat, StoredMessage,
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreatePersonalChatRequest {
    /// The other participant
    pub peer_user_id: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PersonalChatResponse {
    pub chat_id: String,
    pub participants: Vec<String>,
    /// False when the chat already existed for this pair
    pub created: bool,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateGroupChatRequest {
    pub name: Option<String>,
    #[serde(default)]
    pub member_ids: Vec<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SendMessageRequest {
    /// Message text; missing or empty is a 400 and nothing is stored
    pub message: Option<String>,
}

/// Message shape served to clients.
#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message_id: String,
    pub chat_id: String,
    pub sender_user_id: String,
    pub message: String,
    pub sent_at: DateTime<Utc>,
}

impl From<StoredMessage> for MessageResponse {
    fn from(stored: StoredMessage) -> Self {
        Self {
            message_id: stored.message_id,
            chat_id: stored.chat_id,
            sender_user_id: stored.sender_user_id,
            message: stored.body,
            sent_at: stored.sent_at,
        }
    }
}

/// Get or create the personal chat with another user.
///
/// Unique per unordered pair: calling this twice (from either side) returns
/// the same chat id.
#[utoipa::path(
    post,
    path = "/v1/chats/personal",
    tag = "Chats",
    request_body = CreatePersonalChatRequest,
    responses(
        (status = 200, description = "Chat for this pair", body = PersonalChatResponse),
        (status = 400, description = "Missing peer or chat with self"),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "No such peer")
    )
)]
pub async fn create_personal_chat(
    Auth(user): Auth,
    State(state): State<AppState>,
    Json(body): Json<CreatePersonalChatRequest>,
) -> Result<Json<PersonalChatResponse>, ApiError> {
    let peer = body
        .peer_user_id
        .filter(|p| !p.is_empty())
        .ok_or_else(|| ApiError::bad_request("peer_user_id is required"))?;

    if peer == user.user_id {
        return Err(ApiError::bad_request("Cannot open a chat with yourself"));
    }

    // The peer must be a registered user
    IdentityRepository::new(&state.db).get_user(&peer)?;

    let (chat, created) =
        ChatRepository::new(&state.db).get_or_create_personal(&user.user_id, &peer)?;

    Ok(Json(PersonalChatResponse {
        chat_id: chat.chat_id,
        participants: chat.participants.to_vec(),
        created,
    }))
}

/// List the chats the caller belongs to, personal and group.
#[utoipa::path(
    get,
    path = "/v1/chats",
    tag = "Chats",
    responses(
        (status = 200, description = "Caller's chats", body = Vec<ChatListEntry>),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn list_chats(
    Auth(user): Auth,
    State(state): State<AppState>,
) -> Result<Json<Vec<ChatListEntry>>, ApiError> {
    let chats = ChatRepository::new(&state.db).list_for_user(&user.user_id)?;
    Ok(Json(chats))
}

/// Create a group chat. The caller owns it and is always a member.
#[utoipa::path(
    post,
    path = "/v1/chats/group",
    tag = "Chats",
    request_body = CreateGroupChatRequest,
    responses(
        (status = 201, description = "Group created", body = StoredGroupChat),
        (status = 400, description = "Missing or empty group name"),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn create_group_chat(
    Auth(user): Auth,
    State(state): State<AppState>,
    Json(body): Json<CreateGroupChatRequest>,
) -> Result<(StatusCode, Json<StoredGroupChat>), ApiError> {
    let name = body
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| ApiError::bad_request("Group name is required"))?;

    let chat =
        ChatRepository::new(&state.db).create_group(name, &user.user_id, &body.member_ids)?;
    Ok((StatusCode::CREATED, Json(chat)))
}

/// Send a message into a chat.
///
/// Validation happens before any write: a missing or empty `message` is a
/// 400 and nothing is inserted. The other participants each get a
/// `new_message` notification.
#[utoipa::path(
    post,
    path = "/v1/chats/{chat_id}/messages",
    tag = "Chats",
    params(
        ("chat_id" = String, Path, description = "Chat identifier")
    ),
    request_body = SendMessageRequest,
    responses(
        (status = 201, description = "Message stored", body = MessageResponse),
        (status = 400, description = "Missing or empty message"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Caller is not a participant"),
        (status = 404, description = "No such chat")
    )
)]
pub async fn send_message(
    Auth(user): Auth,
    State(state): State<AppState>,
    Path(chat_id): Path<String>,
    Json(body): Json<SendMessageRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    let text = body
        .message
        .as_deref()
        .filter(|m| !m.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("message is required"))?;

    let chats = ChatRepository::new(&state.db);
    let participants = require_participant(&chats, &chat_id, &user.user_id)?;

    let stored = chats.append_message(&chat_id, &user.user_id, text)?;

    // Feed fanout is best-effort; the message is already committed.
    let notifications = NotificationRepository::new(&state.db);
    for recipient in participants.iter().filter(|p| *p != &user.user_id) {
        if let Err(e) = notifications.push(
            recipient,
            NotificationKind::NewMessage,
            &format!("New message in chat {chat_id}"),
        ) {
            tracing::warn!(error = %e, %recipient, "Failed to push message notification");
        }
    }

    Ok((StatusCode::CREATED, Json(stored.into())))
}

/// Messages of a chat, oldest first.
#[utoipa::path(
    get,
    path = "/v1/chats/{chat_id}/messages",
    tag = "Chats",
    params(
        ("chat_id" = String, Path, description = "Chat identifier")
    ),
    responses(
        (status = 200, description = "Messages, oldest first", body = Vec<MessageResponse>),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Caller is not a participant"),
        (status = 404, description = "No such chat")
    )
)]
pub async fn list_messages(
    Auth(user): Auth,
    State(state): State<AppState>,
    Path(chat_id): Path<String>,
) -> Result<Json<Vec<MessageResponse>>, ApiError> {
    let chats = ChatRepository::new(&state.db);
    require_participant(&chats, &chat_id, &user.user_id)?;

    let messages = chats.list_messages(&chat_id)?;
    Ok(Json(messages.into_iter().map(MessageResponse::from).collect()))
}

/// 404 for unknown chats, 403 for chats the caller is not in.
fn require_participant(
    chats: &ChatRepository<'_>,
    chat_id: &str,
    user_id: &str,
) -> Result<Vec<String>, ApiError> {
    let participants = match chats.participants(chat_id) {
        Ok(p) => p,
        Err(StorageError::NotFound(_)) => {
            return Err(ApiError::not_found(format!("Chat {chat_id} not found")))
        }
        Err(e) => return Err(e.into()),
    };
    if !participants.iter().any(|p| p == user_id) {
        return Err(ApiError::forbidden("Not a participant of this chat"));
    }
    Ok(participants)
}
