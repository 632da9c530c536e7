// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Patros Labs

//! Repository layer providing typed access to the platform database.
//!
//! Each repository provides CRUD operations for one entity family, borrowing
//! the shared [`PlatformDb`](super::PlatformDb) for all table operations.

pub mod chats;
pub mod identity;
pub mod notifications;
pub mod subscriptions;
pub mod tokens;

pub use chats::{
    ChatKind, ChatListEntry, ChatRepository, StoredGroupChat, StoredMessage, StoredPersonalChat,
};
pub use identity::{
    AddressStatus, IdentityRepository, RegisteredIdentity, StoredAddress, StoredPhoto, StoredRole,
    StoredUser,
};
pub use notifications::{NotificationKind, NotificationRepository, StoredNotification};
pub use subscriptions::{
    StoredSubscription, StoredTier, SubscriptionRepository, SubscriptionStatus,
};
pub use tokens::{RefreshTokenRepository, StoredRefreshToken};
