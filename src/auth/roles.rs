// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Patros Labs

//! User roles for authorization.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// User roles for authorization.
///
/// ## Role Hierarchy
///
/// - `Admin` - Full access, including identity administration
/// - `Creator` - Can publish tiers and see their subscribers
/// - `Member` - Normal user: profile, chat, subscribing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Full administrative access
    Admin,
    /// Creator account (owns tiers, receives subscriptions)
    Creator,
    /// Normal member account
    Member,
}

impl Role {
    /// Check if this role has at least the privileges of the required role.
    pub fn has_privilege(&self, required: Role) -> bool {
        match (self, required) {
            // Admin can do anything
            (Role::Admin, _) => true,
            // Creators can do everything members can, plus creator endpoints
            (Role::Creator, Role::Creator | Role::Member) => true,
            (Role::Member, Role::Member) => true,
            _ => false,
        }
    }

    /// Parse role from string (case-insensitive).
    /// Used when reading role rows out of storage.
    pub fn from_str(s: &str) -> Option<Role> {
        match s.to_lowercase().as_str() {
            "admin" => Some(Role::Admin),
            "creator" => Some(Role::Creator),
            "member" => Some(Role::Member),
            _ => None,
        }
    }
}

impl Default for Role {
    /// Default role is Member (least privilege for authenticated users).
    fn default() -> Self {
        Role::Member
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Admin => write!(f, "admin"),
            Role::Creator => write!(f, "creator"),
            Role::Member => write!(f, "member"),
        }
    }
}
