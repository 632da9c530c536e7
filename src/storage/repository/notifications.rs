// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Patros Labs

//! Notification feed repository.
//!
//! Feed rows are keyed `recipient_id|!ts_be|id`; the inverted big-endian
//! timestamp makes a forward range scan return newest entries first.

use chrono::{DateTime, Utc};
use redb::ReadableTable;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::super::db::{
    make_prefix, make_prefix_end, make_seq_key, PlatformDb, StorageError, StorageResult,
    NOTIFICATIONS,
};

/// What a notification is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// Someone sent a message in one of the recipient's chats
    NewMessage,
    /// Someone subscribed to the recipient's tier
    NewSubscriber,
}

/// Stored notification row.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StoredNotification {
    /// Unique notification identifier (UUID)
    pub notification_id: String,
    pub recipient_user_id: String,
    pub kind: NotificationKind,
    /// Human-readable summary shown in the feed
    pub body: String,
    pub created_at: DateTime<Utc>,
    /// Set once the recipient marks the entry read
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_at: Option<DateTime<Utc>>,
}

/// Repository for notification feeds.
pub struct NotificationRepository<'a> {
    db: &'a PlatformDb,
}

impl<'a> NotificationRepository<'a> {
    pub fn new(db: &'a PlatformDb) -> Self {
        Self { db }
    }

    /// Push a notification onto a user's feed.
    pub fn push(
        &self,
        recipient_user_id: &str,
        kind: NotificationKind,
        body: &str,
    ) -> StorageResult<StoredNotification> {
        let notification = StoredNotification {
            notification_id: uuid::Uuid::new_v4().to_string(),
            recipient_user_id: recipient_user_id.to_string(),
            kind,
            body: body.to_string(),
            created_at: Utc::now(),
            read_at: None,
        };

        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(NOTIFICATIONS)?;
            let key = feed_key(&notification);
            table.insert(key.as_slice(), serde_json::to_vec(&notification)?.as_slice())?;
        }
        txn.commit()?;

        Ok(notification)
    }

    /// A user's feed, newest first.
    pub fn list_for_user(&self, user_id: &str) -> StorageResult<Vec<StoredNotification>> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(NOTIFICATIONS)?;

        let start = make_prefix(user_id);
        let end = make_prefix_end(user_id);

        let mut result = Vec::new();
        for entry in table.range(start.as_slice()..end.as_slice())? {
            let entry = entry?;
            result.push(serde_json::from_slice(entry.1.value())?);
        }
        Ok(result)
    }

    /// Mark one of the recipient's notifications read.
    ///
    /// Not-found covers both unknown ids and ids belonging to someone else;
    /// the feed never leaks other users' entries.
    pub fn mark_read(
        &self,
        recipient_user_id: &str,
        notification_id: &str,
    ) -> StorageResult<StoredNotification> {
        let txn = self.db.begin_write()?;
        let updated = {
            let mut table = txn.open_table(NOTIFICATIONS)?;

            let start = make_prefix(recipient_user_id);
            let end = make_prefix_end(recipient_user_id);

            let mut found: Option<(Vec<u8>, StoredNotification)> = None;
            for entry in table.range(start.as_slice()..end.as_slice())? {
                let entry = entry?;
                let stored: StoredNotification = serde_json::from_slice(entry.1.value())?;
                if stored.notification_id == notification_id {
                    found = Some((entry.0.value().to_vec(), stored));
                    break;
                }
            }

            let (key, mut stored) = found.ok_or_else(|| {
                StorageError::NotFound(format!("Notification {notification_id}"))
            })?;

            if stored.read_at.is_none() {
                stored.read_at = Some(Utc::now());
                table.insert(key.as_slice(), serde_json::to_vec(&stored)?.as_slice())?;
            }
            stored
        };
        txn.commit()?;

        Ok(updated)
    }
}

fn feed_key(notification: &StoredNotification) -> Vec<u8> {
    // Inverted timestamp: newest entries first on a forward scan
    make_seq_key(
        &notification.recipient_user_id,
        !(notification.created_at.timestamp_millis() as u64),
        &notification.notification_id,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_db() -> (PlatformDb, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let db = PlatformDb::open(&dir.path().join("test.redb")).unwrap();
        (db, dir)
    }

    #[test]
    fn feed_is_newest_first() {
        let (db, _dir) = temp_db();
        let repo = NotificationRepository::new(&db);

        for body in ["first", "second", "third"] {
            repo.push("user-1", NotificationKind::NewMessage, body).unwrap();
            std::thread::sleep(std::time::Duration::from_millis(2));
        }

        let feed = repo.list_for_user("user-1").unwrap();
        let bodies: Vec<_> = feed.iter().map(|n| n.body.as_str()).collect();
        assert_eq!(bodies, vec!["third", "second", "first"]);
    }

    #[test]
    fn feeds_are_per_recipient() {
        let (db, _dir) = temp_db();
        let repo = NotificationRepository::new(&db);

        repo.push("user-1", NotificationKind::NewMessage, "for one").unwrap();
        repo.push("user-2", NotificationKind::NewSubscriber, "for two").unwrap();

        let feed = repo.list_for_user("user-1").unwrap();
        assert_eq!(feed.len(), 1);
        assert_eq!(feed[0].kind, NotificationKind::NewMessage);
        assert!(repo.list_for_user("user-3").unwrap().is_empty());
    }

    #[test]
    fn mark_read_sets_timestamp_once() {
        let (db, _dir) = temp_db();
        let repo = NotificationRepository::new(&db);

        let pushed = repo.push("user-1", NotificationKind::NewSubscriber, "hi").unwrap();
        assert!(pushed.read_at.is_none());

        let read = repo.mark_read("user-1", &pushed.notification_id).unwrap();
        let first_read_at = read.read_at.expect("read_at should be set");

        // Idempotent: a second call keeps the original timestamp
        let again = repo.mark_read("user-1", &pushed.notification_id).unwrap();
        assert_eq!(again.read_at, Some(first_read_at));
    }

    #[test]
    fn mark_read_rejects_other_users_entries() {
        let (db, _dir) = temp_db();
        let repo = NotificationRepository::new(&db);

        let pushed = repo.push("user-1", NotificationKind::NewMessage, "hi").unwrap();
        let result = repo.mark_read("user-2", &pushed.notification_id);
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }
}
