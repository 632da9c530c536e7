// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Patros Labs

//! Chat repository: personal chats, group chats, and their messages.
//!
//! Personal chats are unique per unordered participant pair. The pair key
//! (`min_user_id|max_user_id`) and the chat row are written in the same
//! transaction, so two concurrent creation calls for the same pair cannot
//! produce two chats — the second caller always observes the first row.
//!
//! Messages are keyed `chat_id|ts_be|message_id`, giving oldest-first order
//! on a forward range scan. Insertion timestamp is the only ordering
//! guarantee.

use chrono::{DateTime, Utc};
use redb::ReadableTable;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::super::db::{
    make_prefix, make_prefix_end, make_scoped_key, make_seq_key, PlatformDb, StorageError,
    StorageResult, CHAT_BY_PAIR, CHAT_MEMBERSHIP, GROUP_CHATS, MESSAGES, PERSONAL_CHATS,
};

/// Discriminates the two chat tables in membership index values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ChatKind {
    Personal,
    Group,
}

impl ChatKind {
    fn as_str(&self) -> &'static str {
        match self {
            ChatKind::Personal => "personal",
            ChatKind::Group => "group",
        }
    }

    fn from_str(s: &str) -> Option<Self> {
        match s {
            "personal" => Some(ChatKind::Personal),
            "group" => Some(ChatKind::Group),
            _ => None,
        }
    }
}

/// One-to-one chat row.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StoredPersonalChat {
    /// Unique chat identifier (UUID)
    pub chat_id: String,
    /// Exactly two distinct user ids
    pub participants: [String; 2],
    pub created_at: DateTime<Utc>,
}

/// Group chat row.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StoredGroupChat {
    /// Unique chat identifier (UUID)
    pub chat_id: String,
    pub name: String,
    /// User who created the group
    pub owner_user_id: String,
    /// All members, owner included
    pub member_ids: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// Stored message row.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StoredMessage {
    /// Unique message identifier (UUID)
    pub message_id: String,
    pub chat_id: String,
    pub sender_user_id: String,
    pub body: String,
    pub sent_at: DateTime<Utc>,
}

/// One entry in a user's chat list.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChatListEntry {
    pub chat_id: String,
    pub kind: ChatKind,
    /// Group name; absent for personal chats
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// All participant user ids
    pub participants: Vec<String>,
}

/// Unordered pair key for personal chat uniqueness.
fn make_pair_key(user_a: &str, user_b: &str) -> String {
    if user_a <= user_b {
        format!("{user_a}|{user_b}")
    } else {
        format!("{user_b}|{user_a}")
    }
}

/// Repository for chat rows and messages.
pub struct ChatRepository<'a> {
    db: &'a PlatformDb,
}

impl<'a> ChatRepository<'a> {
    pub fn new(db: &'a PlatformDb) -> Self {
        Self { db }
    }

    /// Get the personal chat for an unordered pair, creating it if absent.
    ///
    /// Returns the chat and whether this call created it. Lookup and insert
    /// share one write transaction, so the pair stays unique under
    /// concurrent calls.
    pub fn get_or_create_personal(
        &self,
        user_a: &str,
        user_b: &str,
    ) -> StorageResult<(StoredPersonalChat, bool)> {
        let pair_key = make_pair_key(user_a, user_b);

        let txn = self.db.begin_write()?;
        let (chat, created) = {
            let mut by_pair = txn.open_table(CHAT_BY_PAIR)?;
            let existing = by_pair.get(pair_key.as_str())?.map(|v| v.value().to_string());

            match existing {
                Some(chat_id) => {
                    let chats = txn.open_table(PERSONAL_CHATS)?;
                    let value = chats
                        .get(chat_id.as_str())?
                        .ok_or_else(|| StorageError::NotFound(format!("Chat {chat_id}")))?;
                    (serde_json::from_slice(value.value())?, false)
                }
                None => {
                    let chat = StoredPersonalChat {
                        chat_id: uuid::Uuid::new_v4().to_string(),
                        participants: [user_a.to_string(), user_b.to_string()],
                        created_at: Utc::now(),
                    };

                    by_pair.insert(pair_key.as_str(), chat.chat_id.as_str())?;

                    let mut chats = txn.open_table(PERSONAL_CHATS)?;
                    chats.insert(
                        chat.chat_id.as_str(),
                        serde_json::to_vec(&chat)?.as_slice(),
                    )?;

                    let mut membership = txn.open_table(CHAT_MEMBERSHIP)?;
                    for user_id in &chat.participants {
                        let key = make_scoped_key(user_id, &chat.chat_id);
                        membership.insert(key.as_slice(), ChatKind::Personal.as_str())?;
                    }

                    (chat, true)
                }
            }
        };
        txn.commit()?;

        Ok((chat, created))
    }

    /// Create a group chat. The owner is always a member.
    pub fn create_group(
        &self,
        name: &str,
        owner_user_id: &str,
        member_ids: &[String],
    ) -> StorageResult<StoredGroupChat> {
        let mut members: Vec<String> = Vec::with_capacity(member_ids.len() + 1);
        members.push(owner_user_id.to_string());
        for id in member_ids {
            if !members.contains(id) {
                members.push(id.clone());
            }
        }

        let chat = StoredGroupChat {
            chat_id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            owner_user_id: owner_user_id.to_string(),
            member_ids: members,
            created_at: Utc::now(),
        };

        let txn = self.db.begin_write()?;
        {
            let mut groups = txn.open_table(GROUP_CHATS)?;
            groups.insert(
                chat.chat_id.as_str(),
                serde_json::to_vec(&chat)?.as_slice(),
            )?;

            let mut membership = txn.open_table(CHAT_MEMBERSHIP)?;
            for user_id in &chat.member_ids {
                let key = make_scoped_key(user_id, &chat.chat_id);
                membership.insert(key.as_slice(), ChatKind::Group.as_str())?;
            }
        }
        txn.commit()?;

        Ok(chat)
    }

    /// Participant user ids of a chat of either kind.
    pub fn participants(&self, chat_id: &str) -> StorageResult<Vec<String>> {
        let txn = self.db.begin_read()?;

        let personal = txn.open_table(PERSONAL_CHATS)?;
        if let Some(value) = personal.get(chat_id)? {
            let chat: StoredPersonalChat = serde_json::from_slice(value.value())?;
            return Ok(chat.participants.to_vec());
        }

        let groups = txn.open_table(GROUP_CHATS)?;
        if let Some(value) = groups.get(chat_id)? {
            let chat: StoredGroupChat = serde_json::from_slice(value.value())?;
            return Ok(chat.member_ids);
        }

        Err(StorageError::NotFound(format!("Chat {chat_id}")))
    }

    /// All chats a user belongs to, personal and group.
    pub fn list_for_user(&self, user_id: &str) -> StorageResult<Vec<ChatListEntry>> {
        let txn = self.db.begin_read()?;
        let membership = txn.open_table(CHAT_MEMBERSHIP)?;
        let personal = txn.open_table(PERSONAL_CHATS)?;
        let groups = txn.open_table(GROUP_CHATS)?;

        let start = make_prefix(user_id);
        let end = make_prefix_end(user_id);

        let mut entries = Vec::new();
        for entry in membership.range(start.as_slice()..end.as_slice())? {
            let entry = entry?;
            let key = entry.0.value().to_vec();
            let Some(kind) = ChatKind::from_str(entry.1.value()) else {
                continue;
            };
            let Some(chat_id) = super::super::db::extract_trailing_id(&key) else {
                continue;
            };

            match kind {
                ChatKind::Personal => {
                    if let Some(value) = personal.get(chat_id.as_str())? {
                        let chat: StoredPersonalChat = serde_json::from_slice(value.value())?;
                        entries.push(ChatListEntry {
                            chat_id: chat.chat_id,
                            kind,
                            name: None,
                            participants: chat.participants.to_vec(),
                        });
                    }
                }
                ChatKind::Group => {
                    if let Some(value) = groups.get(chat_id.as_str())? {
                        let chat: StoredGroupChat = serde_json::from_slice(value.value())?;
                        entries.push(ChatListEntry {
                            chat_id: chat.chat_id,
                            kind,
                            name: Some(chat.name),
                            participants: chat.member_ids,
                        });
                    }
                }
            }
        }
        Ok(entries)
    }

    /// Append a message row. The caller is responsible for participant
    /// checks; the repository only requires that the chat exists.
    pub fn append_message(
        &self,
        chat_id: &str,
        sender_user_id: &str,
        body: &str,
    ) -> StorageResult<StoredMessage> {
        // Existence check doubles as the personal/group discriminator.
        self.participants(chat_id)?;

        let message = StoredMessage {
            message_id: uuid::Uuid::new_v4().to_string(),
            chat_id: chat_id.to_string(),
            sender_user_id: sender_user_id.to_string(),
            body: body.to_string(),
            sent_at: Utc::now(),
        };

        let txn = self.db.begin_write()?;
        {
            let mut messages = txn.open_table(MESSAGES)?;
            let key = make_seq_key(
                chat_id,
                message.sent_at.timestamp_millis() as u64,
                &message.message_id,
            );
            messages.insert(key.as_slice(), serde_json::to_vec(&message)?.as_slice())?;
        }
        txn.commit()?;

        Ok(message)
    }

    /// Messages of a chat, oldest first.
    pub fn list_messages(&self, chat_id: &str) -> StorageResult<Vec<StoredMessage>> {
        let txn = self.db.begin_read()?;
        let messages = txn.open_table(MESSAGES)?;

        let start = make_prefix(chat_id);
        let end = make_prefix_end(chat_id);

        let mut result = Vec::new();
        for entry in messages.range(start.as_slice()..end.as_slice())? {
            let entry = entry?;
            result.push(serde_json::from_slice(entry.1.value())?);
        }
        Ok(result)
    }
}
