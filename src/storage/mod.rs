// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Patros Labs

//! # Storage Module
//!
//! Persistent storage for all platform entities, backed by a single
//! embedded redb database (pure Rust, ACID, single file).
//!
//! ## Layout
//!
//! - [`db`] owns the database handle, table definitions, and composite-key
//!   helpers for time-ordered and scoped range scans.
//! - [`repository`] exposes one typed repository per entity family:
//!   identity (addresses/users/roles/photos), chats, subscriptions,
//!   notifications, and refresh tokens.
//!
//! All multi-row operations that must be atomic (registration, cascade
//! deletion, pair-unique chat creation) run inside a single write
//! transaction; redb serializes writers, so those invariants hold under
//! concurrent requests.

pub mod db;
pub mod repository;

pub use db::{PlatformDb, StorageError, StorageResult};
pub use repository::{
    AddressStatus, ChatKind, ChatListEntry, ChatRepository, IdentityRepository, NotificationKind,
    NotificationRepository, RefreshTokenRepository, RegisteredIdentity, StoredAddress,
    StoredGroupChat, StoredMessage, StoredNotification, StoredPersonalChat, StoredPhoto,
    StoredRefreshToken, StoredRole, StoredSubscription, StoredTier, StoredUser,
    SubscriptionRepository, SubscriptionStatus,
};
