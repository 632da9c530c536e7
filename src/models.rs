// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Patros Labs

//! # Shared API Data Models
//!
//! Types used across multiple endpoint modules. Handler-specific request and
//! response bodies live next to their handlers; only the identity primitives
//! shared by auth, profiles, chat, and subscriptions live here.

use alloy::primitives::Address;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// =============================================================================
// Chain Address Type
// =============================================================================

/// EVM-compatible account address wrapper.
///
/// The platform anchors identity on a blockchain account. Addresses are
/// stored in their EIP-55 checksummed form and compared case-insensitively.
///
/// Format: `0x` followed by 40 hexadecimal characters (20 bytes).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ChainAddress(pub String);

impl ChainAddress {
    /// Parse and checksum an address string.
    ///
    /// Accepts any casing; the stored form is always EIP-55 checksummed.
    pub fn parse(raw: &str) -> Option<Self> {
        let addr: Address = raw.trim().parse().ok()?;
        Some(Self(addr.to_checksum(None)))
    }

    /// Lowercase form used as the unique storage key.
    pub fn storage_key(&self) -> String {
        self.0.to_lowercase()
    }
}

impl std::fmt::Display for ChainAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Address> for ChainAddress {
    fn from(value: Address) -> Self {
        ChainAddress(value.to_checksum(None))
    }
}

impl From<ChainAddress> for String {
    fn from(value: ChainAddress) -> Self {
        value.0
    }
}

// =============================================================================
// Gender
// =============================================================================

/// Profile gender field.
///
/// The wire format is the single-letter form used by existing clients:
/// `"L"` (laki-laki, male) or `"P"` (perempuan, female).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum Gender {
    #[serde(rename = "L")]
    Male,
    #[serde(rename = "P")]
    Female,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_checksums_any_casing() {
        let lower = ChainAddress::parse("0xd8da6bf26964af9d7eed9e03e53415d37aa96045").unwrap();
        let upper = ChainAddress::parse("0xD8DA6BF26964AF9D7EED9E03E53415D37AA96045").unwrap();
        assert_eq!(lower, upper);
        assert_eq!(lower.0, "0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045");
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(ChainAddress::parse("not-an-address").is_none());
        assert!(ChainAddress::parse("0x1234").is_none());
        assert!(ChainAddress::parse("").is_none());
    }

    #[test]
    fn storage_key_is_lowercase() {
        let addr = ChainAddress::parse("0xD8DA6BF26964AF9D7EED9E03E53415D37AA96045").unwrap();
        assert_eq!(
            addr.storage_key(),
            "0xd8da6bf26964af9d7eed9e03e53415d37aa96045"
        );
    }

    #[test]
    fn gender_wire_format_is_single_letter() {
        assert_eq!(serde_json::to_string(&Gender::Male).unwrap(), r#""L""#);
        assert_eq!(serde_json::to_string(&Gender::Female).unwrap(), r#""P""#);
        let parsed: Gender = serde_json::from_str(r#""P""#).unwrap();
        assert_eq!(parsed, Gender::Female);
    }
}
