// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Patros Labs

//! Refresh token repository.
//!
//! Only the SHA-256 hash of a refresh token is ever stored; the opaque
//! token itself exists once, in the response that issued it. Rotation
//! revokes the old row and records which hash replaced it, so reuse of a
//! rotated token is detectable.

use chrono::{DateTime, Utc};
use redb::ReadableTable;
use serde::{Deserialize, Serialize};

use super::super::db::{PlatformDb, StorageError, StorageResult, REFRESH_TOKENS};

/// Persisted refresh token state, keyed by token hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredRefreshToken {
    /// SHA-256 of the opaque token, base64url
    pub token_hash: String,
    pub user_id: String,
    pub address_id: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    /// Set on logout or rotation
    pub revoked_at: Option<DateTime<Utc>>,
    /// Hash of the token that superseded this one
    pub replaced_by: Option<String>,
}

impl StoredRefreshToken {
    /// Usable: unexpired and not revoked.
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.revoked_at.is_none() && now < self.expires_at
    }
}

/// Repository for refresh token rows.
pub struct RefreshTokenRepository<'a> {
    db: &'a PlatformDb,
}

impl<'a> RefreshTokenRepository<'a> {
    pub fn new(db: &'a PlatformDb) -> Self {
        Self { db }
    }

    /// Persist a freshly issued token hash.
    pub fn insert(&self, token: &StoredRefreshToken) -> StorageResult<()> {
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(REFRESH_TOKENS)?;
            table.insert(
                token.token_hash.as_str(),
                serde_json::to_vec(token)?.as_slice(),
            )?;
        }
        txn.commit()?;
        Ok(())
    }

    /// Look up a token row by hash.
    pub fn get(&self, token_hash: &str) -> StorageResult<StoredRefreshToken> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(REFRESH_TOKENS)?;
        match table.get(token_hash)? {
            Some(v) => Ok(serde_json::from_slice(v.value())?),
            None => Err(StorageError::NotFound("Refresh token".to_string())),
        }
    }

    /// Revoke a token, optionally recording its successor's hash.
    pub fn revoke(&self, token_hash: &str, replaced_by: Option<&str>) -> StorageResult<()> {
        let mut stored = self.get(token_hash)?;
        stored.revoked_at = Some(Utc::now());
        stored.replaced_by = replaced_by.map(str::to_string);

        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(REFRESH_TOKENS)?;
            table.insert(token_hash, serde_json::to_vec(&stored)?.as_slice())?;
        }
        txn.commit()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn temp_db() -> (PlatformDb, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let db = PlatformDb::open(&dir.path().join("test.redb")).unwrap();
        (db, dir)
    }

    fn sample(hash: &str) -> StoredRefreshToken {
        let now = Utc::now();
        StoredRefreshToken {
            token_hash: hash.to_string(),
            user_id: "user-1".to_string(),
            address_id: "addr-1".to_string(),
            issued_at: now,
            expires_at: now + Duration::days(30),
            revoked_at: None,
            replaced_by: None,
        }
    }

    #[test]
    fn insert_and_get_roundtrip() {
        let (db, _dir) = temp_db();
        let repo = RefreshTokenRepository::new(&db);

        let token = sample("hash-a");
        repo.insert(&token).unwrap();

        let loaded = repo.get("hash-a").unwrap();
        assert_eq!(loaded.user_id, "user-1");
        assert!(loaded.is_active(Utc::now()));
    }

    #[test]
    fn unknown_hash_is_not_found() {
        let (db, _dir) = temp_db();
        let repo = RefreshTokenRepository::new(&db);
        assert!(matches!(
            repo.get("missing"),
            Err(StorageError::NotFound(_))
        ));
    }

    #[test]
    fn revoked_token_is_inactive_and_tracks_successor() {
        let (db, _dir) = temp_db();
        let repo = RefreshTokenRepository::new(&db);

        repo.insert(&sample("hash-a")).unwrap();
        repo.revoke("hash-a", Some("hash-b")).unwrap();

        let loaded = repo.get("hash-a").unwrap();
        assert!(!loaded.is_active(Utc::now()));
        assert_eq!(loaded.replaced_by.as_deref(), Some("hash-b"));
    }

    #[test]
    fn expired_token_is_inactive() {
        let (db, _dir) = temp_db();
        let repo = RefreshTokenRepository::new(&db);

        let mut token = sample("hash-old");
        token.expires_at = Utc::now() - Duration::hours(1);
        repo.insert(&token).unwrap();

        assert!(!repo.get("hash-old").unwrap().is_active(Utc::now()));
    }
}
