// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Patros Labs

use std::sync::Arc;

use alloy::primitives::Address;
use tokio::sync::RwLock;

use crate::auth::{NonceManager, SessionKeys};
use crate::storage::PlatformDb;

/// Shared application state.
///
/// Cheap to clone: everything is behind an `Arc`. The database handles its
/// own locking (redb serializes writers), so only the nonce cache needs an
/// async lock.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<PlatformDb>,
    pub nonces: Arc<RwLock<NonceManager>>,
    pub session_keys: SessionKeys,
    /// On-chain subscription manager contract. `None` disables the
    /// subscription endpoints (they respond 503).
    pub subscription_manager: Option<Address>,
}

impl AppState {
    pub fn new(db: PlatformDb, session_keys: SessionKeys) -> Self {
        Self {
            db: Arc::new(db),
            nonces: Arc::new(RwLock::new(NonceManager::new())),
            session_keys,
            subscription_manager: None,
        }
    }

    pub fn with_subscription_manager(mut self, address: Option<Address>) -> Self {
        self.subscription_manager = address;
        self
    }
}
