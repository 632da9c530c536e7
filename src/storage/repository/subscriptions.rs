// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Patros Labs

//! Subscription repository: creator tiers and recorded subscriptions.
//!
//! Subscriptions are a recording endpoint only — payment settles against
//! the subscription-manager contract on-chain, so every stored row has
//! status `Done`. There is no pending state to advance.

use chrono::{DateTime, Utc};
use redb::ReadableTable;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::super::db::{
    make_prefix, make_prefix_end, make_scoped_key, PlatformDb, StorageResult, SUBSCRIPTIONS,
    SUBS_BY_CREATOR, SUBS_BY_USER, TIERS,
};

/// Subscription status.
///
/// On-chain payment is verified externally; the API only records completed
/// purchases, so `Done` is the sole state a row can ever hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum SubscriptionStatus {
    Done,
}

/// A named subscription level purchasable against a creator.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StoredTier {
    /// Unique tier identifier (UUID)
    pub tier_id: String,
    pub creator_user_id: String,
    pub name: String,
    /// Price in wei, as charged by the contract
    pub price_wei: String,
    pub created_at: DateTime<Utc>,
}

/// A recorded subscription.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StoredSubscription {
    /// Unique subscription identifier (UUID)
    pub subscription_id: String,
    pub creator_user_id: String,
    pub subscriber_user_id: String,
    /// Tier name at purchase time
    pub tier: String,
    pub status: SubscriptionStatus,
    pub created_at: DateTime<Utc>,
}

/// Repository for tiers and subscriptions.
pub struct SubscriptionRepository<'a> {
    db: &'a PlatformDb,
}

impl<'a> SubscriptionRepository<'a> {
    pub fn new(db: &'a PlatformDb) -> Self {
        Self { db }
    }

    /// Insert a tier record for a creator.
    pub fn create_tier(
        &self,
        creator_user_id: &str,
        name: &str,
        price_wei: &str,
    ) -> StorageResult<StoredTier> {
        let tier = StoredTier {
            tier_id: uuid::Uuid::new_v4().to_string(),
            creator_user_id: creator_user_id.to_string(),
            name: name.to_string(),
            price_wei: price_wei.to_string(),
            created_at: Utc::now(),
        };

        let txn = self.db.begin_write()?;
        {
            let mut tiers = txn.open_table(TIERS)?;
            let key = make_scoped_key(creator_user_id, &tier.tier_id);
            tiers.insert(key.as_slice(), serde_json::to_vec(&tier)?.as_slice())?;
        }
        txn.commit()?;

        Ok(tier)
    }

    /// List a creator's tiers.
    pub fn list_tiers(&self, creator_user_id: &str) -> StorageResult<Vec<StoredTier>> {
        let txn = self.db.begin_read()?;
        let tiers = txn.open_table(TIERS)?;

        let start = make_prefix(creator_user_id);
        let end = make_prefix_end(creator_user_id);

        let mut result = Vec::new();
        for entry in tiers.range(start.as_slice()..end.as_slice())? {
            let entry = entry?;
            result.push(serde_json::from_slice(entry.1.value())?);
        }
        Ok(result)
    }

    /// Record a subscription. Status is always `Done`.
    pub fn record(
        &self,
        creator_user_id: &str,
        subscriber_user_id: &str,
        tier: &str,
    ) -> StorageResult<StoredSubscription> {
        let subscription = StoredSubscription {
            subscription_id: uuid::Uuid::new_v4().to_string(),
            creator_user_id: creator_user_id.to_string(),
            subscriber_user_id: subscriber_user_id.to_string(),
            tier: tier.to_string(),
            status: SubscriptionStatus::Done,
            created_at: Utc::now(),
        };

        let txn = self.db.begin_write()?;
        {
            let mut subs = txn.open_table(SUBSCRIPTIONS)?;
            subs.insert(
                subscription.subscription_id.as_str(),
                serde_json::to_vec(&subscription)?.as_slice(),
            )?;

            let mut by_creator = txn.open_table(SUBS_BY_CREATOR)?;
            let creator_key = make_scoped_key(creator_user_id, &subscription.subscription_id);
            by_creator.insert(creator_key.as_slice(), subscription.subscription_id.as_str())?;

            let mut by_user = txn.open_table(SUBS_BY_USER)?;
            let user_key = make_scoped_key(subscriber_user_id, &subscription.subscription_id);
            by_user.insert(user_key.as_slice(), subscription.subscription_id.as_str())?;
        }
        txn.commit()?;

        Ok(subscription)
    }

    /// Subscriptions made by a user.
    pub fn list_by_subscriber(&self, user_id: &str) -> StorageResult<Vec<StoredSubscription>> {
        self.list_via_index(SUBS_BY_USER, user_id)
    }

    /// Subscriptions received by a creator.
    pub fn list_by_creator(&self, creator_user_id: &str) -> StorageResult<Vec<StoredSubscription>> {
        self.list_via_index(SUBS_BY_CREATOR, creator_user_id)
    }

    fn list_via_index(
        &self,
        index: redb::TableDefinition<&[u8], &str>,
        scope: &str,
    ) -> StorageResult<Vec<StoredSubscription>> {
        let txn = self.db.begin_read()?;
        let idx = txn.open_table(index)?;
        let subs = txn.open_table(SUBSCRIPTIONS)?;

        let start = make_prefix(scope);
        let end = make_prefix_end(scope);

        let mut result = Vec::new();
        for entry in idx.range(start.as_slice()..end.as_slice())? {
            let entry = entry?;
            let subscription_id = entry.1.value().to_string();
            if let Some(value) = subs.get(subscription_id.as_str())? {
                result.push(serde_json::from_slice(value.value())?);
            }
        }
        Ok(result)
    }
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
    fn tiers_list_per_creator() {
        let (db, _dir) = temp_db();
        let repo = SubscriptionRepository::new(&db);

        repo.create_tier("creator-1", "bronze", "1000000000000000").unwrap();
        repo.create_tier("creator-1", "gold", "5000000000000000").unwrap();
        repo.create_tier("creator-2", "solo", "2000000000000000").unwrap();

        let tiers = repo.list_tiers("creator-1").unwrap();
        assert_eq!(tiers.len(), 2);
        assert!(tiers.iter().all(|t| t.creator_user_id == "creator-1"));

        assert_eq!(repo.list_tiers("creator-2").unwrap().len(), 1);
        assert!(repo.list_tiers("creator-3").unwrap().is_empty());
    }

    #[test]
    fn recorded_subscription_is_always_done() {
        let (db, _dir) = temp_db();
        let repo = SubscriptionRepository::new(&db);

        let sub = repo.record("creator-1", "fan-1", "gold").unwrap();
        assert_eq!(sub.status, SubscriptionStatus::Done);
        assert_eq!(sub.tier, "gold");

        let stored = repo.list_by_subscriber("fan-1").unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].status, SubscriptionStatus::Done);
    }

    #[test]
    fn creator_and_subscriber_views_agree() {
        let (db, _dir) = temp_db();
        let repo = SubscriptionRepository::new(&db);

        repo.record("creator-1", "fan-1", "gold").unwrap();
        repo.record("creator-1", "fan-2", "bronze").unwrap();
        repo.record("creator-2", "fan-1", "solo").unwrap();

        assert_eq!(repo.list_by_creator("creator-1").unwrap().len(), 2);
        assert_eq!(repo.list_by_creator("creator-2").unwrap().len(), 1);
        assert_eq!(repo.list_by_subscriber("fan-1").unwrap().len(), 2);
        assert_eq!(repo.list_by_subscriber("fan-2").unwrap().len(), 1);
    }

    #[test]
    fn status_serializes_as_done_string() {
        let (db, _dir) = temp_db();
        let repo = SubscriptionRepository::new(&db);

        let sub = repo.record("creator-1", "fan-1", "gold").unwrap();
        let json = serde_json::to_value(&sub).unwrap();
        assert_eq!(json["status"], "Done");
    }
}
