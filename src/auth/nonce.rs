// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Patros Labs

//! Single-use sign-in nonces.
//!
//! A nonce binds one signature challenge to one address for a short window.
//! Nonces live only in memory: losing them on restart just means the wallet
//! re-requests a challenge. The cache is bounded, so a flood of nonce
//! requests evicts the oldest entries instead of growing without limit.

use std::num::NonZeroUsize;

use chrono::{DateTime, Duration, Utc};
use lru::LruCache;

use crate::models::ChainAddress;

use super::AuthError;

/// How long a nonce stays valid.
const NONCE_TTL_MINUTES: i64 = 5;

/// Bound on concurrently outstanding nonces.
const NONCE_CACHE_CAPACITY: usize = 4096;

/// Challenge message the wallet signs (EIP-191 personal_sign payload).
///
/// The exact string matters: verification recovers the signer from this
/// same rendering, so both sides must agree byte for byte.
pub fn challenge_message(address: &ChainAddress, nonce: &str) -> String {
    format!(
        "Sign in to Patros\n\nAddress: {address}\nNonce: {nonce}"
    )
}

#[derive(Debug, Clone)]
struct IssuedNonce {
    nonce: String,
    expires_at: DateTime<Utc>,
}

/// Bounded in-memory store of outstanding nonces, keyed by address.
///
/// Issuing a new nonce for an address replaces any previous one, and a
/// successful (or failed) verification consumes the entry, making each
/// challenge single-use.
pub struct NonceManager {
    nonces: LruCache<String, IssuedNonce>,
}

impl NonceManager {
    pub fn new() -> Self {
        Self {
            nonces: LruCache::new(
                NonZeroUsize::new(NONCE_CACHE_CAPACITY).expect("capacity is non-zero"),
            ),
        }
    }

    /// Issue a fresh nonce for an address, replacing any outstanding one.
    pub fn issue(&mut self, address: &ChainAddress) -> String {
        let nonce = uuid::Uuid::new_v4().to_string();
        self.nonces.put(
            address.storage_key(),
            IssuedNonce {
                nonce: nonce.clone(),
                expires_at: Utc::now() + Duration::minutes(NONCE_TTL_MINUTES),
            },
        );
        nonce
    }

    /// Consume the outstanding nonce for an address.
    ///
    /// The entry is removed regardless of outcome; a failed signature burns
    /// the nonce and the wallet must request a new challenge.
    pub fn consume(&mut self, address: &ChainAddress) -> Result<String, AuthError> {
        let issued = self
            .nonces
            .pop(&address.storage_key())
            .ok_or(AuthError::UnknownNonce)?;

        if Utc::now() > issued.expires_at {
            return Err(AuthError::NonceExpired);
        }
        Ok(issued.nonce)
    }
}

impl Default for NonceManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr() -> ChainAddress {
        ChainAddress::parse("0xd8da6bf26964af9d7eed9e03e53415d37aa96045").unwrap()
    }

    #[test]
    fn issue_then_consume_returns_same_nonce() {
        let mut manager = NonceManager::new();
        let nonce = manager.issue(&addr());
        assert_eq!(manager.consume(&addr()).unwrap(), nonce);
    }

    #[test]
    fn nonces_are_single_use() {
        let mut manager = NonceManager::new();
        manager.issue(&addr());
        manager.consume(&addr()).unwrap();
        assert!(matches!(
            manager.consume(&addr()),
            Err(AuthError::UnknownNonce)
        ));
    }

    #[test]
    fn reissue_replaces_previous_nonce() {
        let mut manager = NonceManager::new();
        let first = manager.issue(&addr());
        let second = manager.issue(&addr());
        assert_ne!(first, second);
        assert_eq!(manager.consume(&addr()).unwrap(), second);
    }

    #[test]
    fn consume_without_issue_is_unknown() {
        let mut manager = NonceManager::new();
        assert!(matches!(
            manager.consume(&addr()),
            Err(AuthError::UnknownNonce)
        ));
    }

    #[test]
    fn challenge_message_embeds_address_and_nonce() {
        let message = challenge_message(&addr(), "nonce-123");
        assert!(message.contains("nonce-123"));
        assert!(message.contains(&addr().0));
    }
}
