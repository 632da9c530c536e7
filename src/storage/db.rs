// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Patros Labs

//! Embedded platform database backed by redb (pure Rust, ACID).
//!
//! ## Table Layout
//!
//! Identity:
//! - `addresses`: lowercase chain address → address_id (unique index)
//! - `address_records`: address_id → serialized StoredAddress
//! - `users`: user_id → serialized StoredUser
//! - `user_by_address`: address_id → user_id
//! - `roles`: address_id → serialized StoredRole
//! - `photos`: photo_id → serialized StoredPhoto
//! - `photo_index`: composite key (address_id|photo_id) → photo_id
//!
//! Chat:
//! - `personal_chats`: chat_id → serialized StoredPersonalChat
//! - `chat_by_pair`: unordered pair key (min_uid|max_uid) → chat_id
//! - `group_chats`: chat_id → serialized StoredGroupChat
//! - `chat_membership`: composite key (user_id|chat_id) → chat kind
//! - `messages`: composite key (chat_id|ts_be|message_id) → serialized
//!   StoredMessage (ascending timestamp for oldest-first scans)
//!
//! Subscriptions:
//! - `tiers`: composite key (creator_user_id|tier_id) → serialized StoredTier
//! - `subscriptions`: subscription_id → serialized StoredSubscription
//! - `subs_by_creator`: composite key (creator_id|sub_id) → subscription_id
//! - `subs_by_user`: composite key (subscriber_id|sub_id) → subscription_id
//!
//! Sessions & feeds:
//! - `refresh_tokens`: token hash → serialized StoredRefreshToken
//! - `notifications`: composite key (recipient_id|!ts_be|id) → serialized
//!   StoredNotification (inverted timestamp for newest-first scans)

use std::path::Path;

use redb::{Database, ReadTransaction, TableDefinition, WriteTransaction};

// =============================================================================
// Table Definitions
// =============================================================================

pub(crate) const ADDRESSES: TableDefinition<&str, &str> = TableDefinition::new("addresses");
pub(crate) const ADDRESS_RECORDS: TableDefinition<&str, &[u8]> =
    TableDefinition::new("address_records");
pub(crate) const USERS: TableDefinition<&str, &[u8]> = TableDefinition::new("users");
pub(crate) const USER_BY_ADDRESS: TableDefinition<&str, &str> =
    TableDefinition::new("user_by_address");
pub(crate) const ROLES: TableDefinition<&str, &[u8]> = TableDefinition::new("roles");
pub(crate) const PHOTOS: TableDefinition<&str, &[u8]> = TableDefinition::new("photos");
pub(crate) const PHOTO_INDEX: TableDefinition<&[u8], &str> = TableDefinition::new("photo_index");

pub(crate) const PERSONAL_CHATS: TableDefinition<&str, &[u8]> =
    TableDefinition::new("personal_chats");
pub(crate) const CHAT_BY_PAIR: TableDefinition<&str, &str> = TableDefinition::new("chat_by_pair");
pub(crate) const GROUP_CHATS: TableDefinition<&str, &[u8]> = TableDefinition::new("group_chats");
pub(crate) const CHAT_MEMBERSHIP: TableDefinition<&[u8], &str> =
    TableDefinition::new("chat_membership");
pub(crate) const MESSAGES: TableDefinition<&[u8], &[u8]> = TableDefinition::new("messages");

pub(crate) const TIERS: TableDefinition<&[u8], &[u8]> = TableDefinition::new("tiers");
pub(crate) const SUBSCRIPTIONS: TableDefinition<&str, &[u8]> =
    TableDefinition::new("subscriptions");
pub(crate) const SUBS_BY_CREATOR: TableDefinition<&[u8], &str> =
    TableDefinition::new("subs_by_creator");
pub(crate) const SUBS_BY_USER: TableDefinition<&[u8], &str> = TableDefinition::new("subs_by_user");

pub(crate) const REFRESH_TOKENS: TableDefinition<&str, &[u8]> =
    TableDefinition::new("refresh_tokens");
pub(crate) const NOTIFICATIONS: TableDefinition<&[u8], &[u8]> =
    TableDefinition::new("notifications");

// =============================================================================
// Error Type
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("redb error: {0}")]
    Redb(#[from] redb::Error),

    #[error("redb database error: {0}")]
    RedbDatabase(#[from] redb::DatabaseError),

    #[error("redb transaction error: {0}")]
    RedbTransaction(#[from] redb::TransactionError),

    #[error("redb table error: {0}")]
    RedbTable(#[from] redb::TableError),

    #[error("redb storage error: {0}")]
    RedbStorage(#[from] redb::StorageError),

    #[error("redb commit error: {0}")]
    RedbCommit(#[from] redb::CommitError),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

// =============================================================================
// Composite Key Helpers
// =============================================================================

/// Build a composite key scoping `id` under `scope`.
///
/// Format: `scope|id`. Used for plain secondary indexes where insertion
/// order does not matter.
pub(crate) fn make_scoped_key(scope: &str, id: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(scope.len() + 1 + id.len());
    key.extend_from_slice(scope.as_bytes());
    key.push(b'|');
    key.extend_from_slice(id.as_bytes());
    key
}

/// Build a time-ordered composite key: `scope|ts_be|id`.
///
/// Plain big-endian timestamps give oldest-first ordering on a forward scan
/// (message history). Pass the bitwise-inverted timestamp for newest-first
/// ordering (notification feeds).
pub(crate) fn make_seq_key(scope: &str, timestamp_be: u64, id: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(scope.len() + 1 + 8 + 1 + id.len());
    key.extend_from_slice(scope.as_bytes());
    key.push(b'|');
    key.extend_from_slice(&timestamp_be.to_be_bytes());
    key.push(b'|');
    key.extend_from_slice(id.as_bytes());
    key
}

/// Prefix for range scanning everything under `scope`.
pub(crate) fn make_prefix(scope: &str) -> Vec<u8> {
    let mut prefix = Vec::with_capacity(scope.len() + 1);
    prefix.extend_from_slice(scope.as_bytes());
    prefix.push(b'|');
    prefix
}

/// Upper bound for a prefix range scan (prefix with 0xFF bytes appended).
pub(crate) fn make_prefix_end(scope: &str) -> Vec<u8> {
    let mut end = Vec::with_capacity(scope.len() + 1 + 20);
    end.extend_from_slice(scope.as_bytes());
    end.push(b'|');
    end.extend_from_slice(&[0xFF; 20]);
    end
}

/// Extract the trailing id from a `scope|id` or `scope|ts|id` composite key.
pub(crate) fn extract_trailing_id(key: &[u8]) -> Option<String> {
    let pos = key.iter().rposition(|&b| b == b'|')?;
    String::from_utf8(key[pos + 1..].to_vec()).ok()
}

// =============================================================================
// PlatformDb
// =============================================================================

/// Embedded ACID database shared by all repositories.
pub struct PlatformDb {
    db: Database,
}

impl PlatformDb {
    /// Open (or create) the database at the given path.
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let path = path.as_ref();
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let db = Database::create(path)?;

        // Pre-create all tables so later read transactions don't fail
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(ADDRESSES)?;
            let _ = write_txn.open_table(ADDRESS_RECORDS)?;
            let _ = write_txn.open_table(USERS)?;
            let _ = write_txn.open_table(USER_BY_ADDRESS)?;
            let _ = write_txn.open_table(ROLES)?;
            let _ = write_txn.open_table(PHOTOS)?;
            let _ = write_txn.open_table(PHOTO_INDEX)?;
            let _ = write_txn.open_table(PERSONAL_CHATS)?;
            let _ = write_txn.open_table(CHAT_BY_PAIR)?;
            let _ = write_txn.open_table(GROUP_CHATS)?;
            let _ = write_txn.open_table(CHAT_MEMBERSHIP)?;
            let _ = write_txn.open_table(MESSAGES)?;
            let _ = write_txn.open_table(TIERS)?;
            let _ = write_txn.open_table(SUBSCRIPTIONS)?;
            let _ = write_txn.open_table(SUBS_BY_CREATOR)?;
            let _ = write_txn.open_table(SUBS_BY_USER)?;
            let _ = write_txn.open_table(REFRESH_TOKENS)?;
            let _ = write_txn.open_table(NOTIFICATIONS)?;
        }
        write_txn.commit()?;

        Ok(Self { db })
    }

    pub(crate) fn begin_read(&self) -> StorageResult<ReadTransaction> {
        use redb::ReadableDatabase;
        Ok(self.db.begin_read()?)
    }

    pub(crate) fn begin_write(&self) -> StorageResult<WriteTransaction> {
        Ok(self.db.begin_write()?)
    }

    /// Cheap end-to-end readability probe for health checks.
    pub fn is_readable(&self) -> bool {
        self.begin_read()
            .and_then(|txn| {
                txn.open_table(ADDRESSES)?;
                Ok(())
            })
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_precreates_tables() {
        let dir = tempfile::tempdir().unwrap();
        let db = PlatformDb::open(&dir.path().join("test.redb")).unwrap();

        // Read transactions on fresh tables must not fail
        let txn = db.begin_read().unwrap();
        assert!(txn.open_table(ADDRESSES).is_ok());
        assert!(txn.open_table(MESSAGES).is_ok());
        assert!(txn.open_table(NOTIFICATIONS).is_ok());
        assert!(db.is_readable());
    }

    #[test]
    fn seq_keys_order_ascending_by_timestamp() {
        let older = make_seq_key("chat-1", 1000, "m1");
        let newer = make_seq_key("chat-1", 2000, "m2");
        assert!(older < newer, "Older timestamps should sort first");
    }

    #[test]
    fn inverted_seq_keys_order_descending() {
        let older = make_seq_key("user-1", !1000u64, "n1");
        let newer = make_seq_key("user-1", !2000u64, "n2");
        assert!(newer < older, "Newer timestamps should sort first");
    }

    #[test]
    fn prefix_bounds_cover_all_scoped_keys() {
        let key = make_seq_key("chat-1", 5, "m");
        assert!(make_prefix("chat-1").as_slice() < key.as_slice());
        assert!(key.as_slice() < make_prefix_end("chat-1").as_slice());

        // Keys under another scope fall outside the bounds
        let other = make_seq_key("chat-2", 5, "m");
        assert!(other.as_slice() > make_prefix_end("chat-1").as_slice());
    }

    #[test]
    fn extract_trailing_id_reads_last_segment() {
        let key = make_seq_key("chat-1", 42, "msg-9");
        assert_eq!(extract_trailing_id(&key), Some("msg-9".to_string()));

        let scoped = make_scoped_key("user-1", "photo-3");
        assert_eq!(extract_trailing_id(&scoped), Some("photo-3".to_string()));
    }
}
