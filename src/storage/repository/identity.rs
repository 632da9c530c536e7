// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Patros Labs

//! Identity repository: addresses, users, roles, and profile photos.
//!
//! An Address row is the identity anchor; exactly one User and one Role row
//! hang off each address, plus any number of photos. Registration creates
//! all three rows in a single write transaction, and address deletion
//! cascades over the same set atomically.

use chrono::{DateTime, Utc};
use redb::ReadableTable;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::Role;
use crate::models::{ChainAddress, Gender};

use super::super::db::{
    extract_trailing_id, make_prefix, make_prefix_end, make_scoped_key, PlatformDb, StorageError,
    StorageResult, ADDRESSES, ADDRESS_RECORDS, PHOTOS, PHOTO_INDEX, ROLES, USERS, USER_BY_ADDRESS,
};

/// Address status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AddressStatus {
    /// Address can sign in and use the platform
    Active,
    /// Address is blocked from signing in
    Disabled,
}

impl Default for AddressStatus {
    fn default() -> Self {
        Self::Active
    }
}

/// Canonical identity record for a chain address.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StoredAddress {
    /// Unique address identifier (UUID)
    pub address_id: String,
    /// EIP-55 checksummed chain address, globally unique
    pub address: ChainAddress,
    /// Current status
    pub status: AddressStatus,
    /// When the address was first seen
    pub created_at: DateTime<Utc>,
}

/// Profile record attached to an address.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StoredUser {
    /// Unique user identifier (UUID)
    pub user_id: String,
    /// Owning address
    pub address_id: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub birth_year: Option<i32>,
    pub country: Option<String>,
    pub gender: Option<Gender>,
    pub bio: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl StoredUser {
    /// Blank profile created on first sign-in.
    pub fn blank(user_id: String, address_id: String, now: DateTime<Utc>) -> Self {
        Self {
            user_id,
            address_id,
            first_name: None,
            last_name: None,
            birth_year: None,
            country: None,
            gender: None,
            bio: None,
            created_at: now,
        }
    }
}

/// Role row attached to an address.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StoredRole {
    /// Unique role row identifier (UUID)
    pub role_id: String,
    /// Owning address
    pub address_id: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// Profile photo row attached to an address.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StoredPhoto {
    /// Unique photo identifier (UUID)
    pub photo_id: String,
    /// Owning address
    pub address_id: String,
    /// Path or URL of the stored image
    pub path: String,
    pub created_at: DateTime<Utc>,
}

/// Everything created by the registration path.
#[derive(Debug, Clone)]
pub struct RegisteredIdentity {
    pub address: StoredAddress,
    pub user: StoredUser,
    pub role: StoredRole,
}

/// Repository for identity rows.
pub struct IdentityRepository<'a> {
    db: &'a PlatformDb,
}

impl<'a> IdentityRepository<'a> {
    pub fn new(db: &'a PlatformDb) -> Self {
        Self { db }
    }

    /// Look up the address_id for a chain address, if registered.
    pub fn find_address_id(&self, address: &ChainAddress) -> StorageResult<Option<String>> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(ADDRESSES)?;
        Ok(table
            .get(address.storage_key().as_str())?
            .map(|v| v.value().to_string()))
    }

    /// Register a new chain address: Address + blank User + Role rows,
    /// all inside one write transaction.
    pub fn register(
        &self,
        address: &ChainAddress,
        role: Role,
    ) -> StorageResult<RegisteredIdentity> {
        let now = Utc::now();
        let stored_address = StoredAddress {
            address_id: uuid::Uuid::new_v4().to_string(),
            address: address.clone(),
            status: AddressStatus::Active,
            created_at: now,
        };
        let user = StoredUser::blank(
            uuid::Uuid::new_v4().to_string(),
            stored_address.address_id.clone(),
            now,
        );
        let stored_role = StoredRole {
            role_id: uuid::Uuid::new_v4().to_string(),
            address_id: stored_address.address_id.clone(),
            role,
            created_at: now,
        };

        let txn = self.db.begin_write()?;
        {
            let mut addresses = txn.open_table(ADDRESSES)?;
            let key = address.storage_key();
            if addresses.get(key.as_str())?.is_some() {
                return Err(StorageError::AlreadyExists(format!("Address {address}")));
            }
            addresses.insert(key.as_str(), stored_address.address_id.as_str())?;

            let mut records = txn.open_table(ADDRESS_RECORDS)?;
            records.insert(
                stored_address.address_id.as_str(),
                serde_json::to_vec(&stored_address)?.as_slice(),
            )?;

            let mut users = txn.open_table(USERS)?;
            users.insert(
                user.user_id.as_str(),
                serde_json::to_vec(&user)?.as_slice(),
            )?;

            let mut by_address = txn.open_table(USER_BY_ADDRESS)?;
            by_address.insert(stored_address.address_id.as_str(), user.user_id.as_str())?;

            let mut roles = txn.open_table(ROLES)?;
            roles.insert(
                stored_address.address_id.as_str(),
                serde_json::to_vec(&stored_role)?.as_slice(),
            )?;
        }
        txn.commit()?;

        Ok(RegisteredIdentity {
            address: stored_address,
            user,
            role: stored_role,
        })
    }

    pub fn get_address(&self, address_id: &str) -> StorageResult<StoredAddress> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(ADDRESS_RECORDS)?;
        match table.get(address_id)? {
            Some(v) => Ok(serde_json::from_slice(v.value())?),
            None => Err(StorageError::NotFound(format!("Address {address_id}"))),
        }
    }

    pub fn get_user(&self, user_id: &str) -> StorageResult<StoredUser> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(USERS)?;
        match table.get(user_id)? {
            Some(v) => Ok(serde_json::from_slice(v.value())?),
            None => Err(StorageError::NotFound(format!("User {user_id}"))),
        }
    }

    pub fn get_user_by_address(&self, address_id: &str) -> StorageResult<StoredUser> {
        let user_id = {
            let txn = self.db.begin_read()?;
            let table = txn.open_table(USER_BY_ADDRESS)?;
            table
                .get(address_id)?
                .map(|v| v.value().to_string())
                .ok_or_else(|| StorageError::NotFound(format!("User for address {address_id}")))?
        };
        self.get_user(&user_id)
    }

    pub fn get_role(&self, address_id: &str) -> StorageResult<StoredRole> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(ROLES)?;
        match table.get(address_id)? {
            Some(v) => Ok(serde_json::from_slice(v.value())?),
            None => Err(StorageError::NotFound(format!("Role for {address_id}"))),
        }
    }

    /// Replace the stored profile for an existing user.
    pub fn update_user(&self, user: &StoredUser) -> StorageResult<()> {
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(USERS)?;
            if table.get(user.user_id.as_str())?.is_none() {
                return Err(StorageError::NotFound(format!("User {}", user.user_id)));
            }
            table.insert(
                user.user_id.as_str(),
                serde_json::to_vec(user)?.as_slice(),
            )?;
        }
        txn.commit()?;
        Ok(())
    }

    /// Change the role stored for an address.
    pub fn set_role(&self, address_id: &str, role: Role) -> StorageResult<StoredRole> {
        let mut stored = self.get_role(address_id)?;
        stored.role = role;
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(ROLES)?;
            table.insert(address_id, serde_json::to_vec(&stored)?.as_slice())?;
        }
        txn.commit()?;
        Ok(stored)
    }

    /// Change the status stored for an address.
    pub fn set_status(
        &self,
        address_id: &str,
        status: AddressStatus,
    ) -> StorageResult<StoredAddress> {
        let mut stored = self.get_address(address_id)?;
        stored.status = status;
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(ADDRESS_RECORDS)?;
            table.insert(address_id, serde_json::to_vec(&stored)?.as_slice())?;
        }
        txn.commit()?;
        Ok(stored)
    }

    /// List every user profile (public directory).
    pub fn list_users(&self) -> StorageResult<Vec<StoredUser>> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(USERS)?;
        let mut users = Vec::new();
        for entry in table.iter()? {
            let (_, value) = entry?;
            users.push(serde_json::from_slice(value.value())?);
        }
        Ok(users)
    }

    /// Attach a profile photo to an address.
    pub fn add_photo(&self, address_id: &str, path: String) -> StorageResult<StoredPhoto> {
        let photo = StoredPhoto {
            photo_id: uuid::Uuid::new_v4().to_string(),
            address_id: address_id.to_string(),
            path,
            created_at: Utc::now(),
        };

        let txn = self.db.begin_write()?;
        {
            let mut photos = txn.open_table(PHOTOS)?;
            photos.insert(
                photo.photo_id.as_str(),
                serde_json::to_vec(&photo)?.as_slice(),
            )?;

            let mut index = txn.open_table(PHOTO_INDEX)?;
            let key = make_scoped_key(address_id, &photo.photo_id);
            index.insert(key.as_slice(), photo.photo_id.as_str())?;
        }
        txn.commit()?;
        Ok(photo)
    }

    /// List photos attached to an address.
    pub fn list_photos(&self, address_id: &str) -> StorageResult<Vec<StoredPhoto>> {
        let txn = self.db.begin_read()?;
        let index = txn.open_table(PHOTO_INDEX)?;
        let photos = txn.open_table(PHOTOS)?;

        let start = make_prefix(address_id);
        let end = make_prefix_end(address_id);

        let mut result = Vec::new();
        for entry in index.range(start.as_slice()..end.as_slice())? {
            let entry = entry?;
            let photo_id = entry.1.value().to_string();
            if let Some(value) = photos.get(photo_id.as_str())? {
                result.push(serde_json::from_slice(value.value())?);
            }
        }
        Ok(result)
    }

    /// Delete an address and everything referencing it, atomically.
    ///
    /// Cascades over the user row, the role row, all photos, and the unique
    /// address index, mirroring the relational FK cascade.
    pub fn delete_address_cascade(&self, address_id: &str) -> StorageResult<()> {
        let stored = self.get_address(address_id)?;

        let txn = self.db.begin_write()?;
        {
            let mut addresses = txn.open_table(ADDRESSES)?;
            addresses.remove(stored.address.storage_key().as_str())?;

            let mut records = txn.open_table(ADDRESS_RECORDS)?;
            records.remove(address_id)?;

            let mut by_address = txn.open_table(USER_BY_ADDRESS)?;
            let user_id = by_address.remove(address_id)?.map(|v| v.value().to_string());

            if let Some(user_id) = user_id {
                let mut users = txn.open_table(USERS)?;
                users.remove(user_id.as_str())?;
            }

            let mut roles = txn.open_table(ROLES)?;
            roles.remove(address_id)?;

            let mut index = txn.open_table(PHOTO_INDEX)?;
            let start = make_prefix(address_id);
            let end = make_prefix_end(address_id);
            let mut photo_ids = Vec::new();
            for entry in index.range(start.as_slice()..end.as_slice())? {
                let entry = entry?;
                photo_ids.push(entry.0.value().to_vec());
            }
            let mut photos = txn.open_table(PHOTOS)?;
            for key in photo_ids {
                if let Some(photo_id) = extract_trailing_id(&key) {
                    photos.remove(photo_id.as_str())?;
                }
                index.remove(key.as_slice())?;
            }
        }
        txn.commit()?;
        Ok(())
    }
}
