// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Patros Labs

//! # Runtime Configuration Constants
//!
//! This module defines environment variable names and default values used
//! throughout the application. Configuration is loaded from the environment
//! at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `DATA_DIR` | Root directory for the embedded database | `/data` |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `SESSION_SECRET` | HMAC key for session tokens | Required |
//! | `SUBSCRIPTION_MANAGER_ADDRESS` | Deployed subscription-manager contract | Optional; gates subscriptions |
//! | `COOKIE_SECURE` | `Secure` attribute on session cookies | `true` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::path::PathBuf;

use alloy::primitives::Address;

/// Environment variable name for the database directory path.
///
/// The embedded redb database file lives at `{DATA_DIR}/platform.redb`.
pub const DATA_DIR_ENV: &str = "DATA_DIR";

/// Environment variable name for the session HMAC secret.
///
/// The server refuses to start without it; session tokens signed with a
/// different key are rejected as unauthenticated.
pub const SESSION_SECRET_ENV: &str = "SESSION_SECRET";

/// Environment variable name for the deployed subscription-manager contract.
///
/// Tier and subscription writes are refused (503) until this is configured
/// with a valid EVM address.
pub const SUBSCRIPTION_MANAGER_ENV: &str = "SUBSCRIPTION_MANAGER_ADDRESS";

/// Environment variable controlling the `Secure` cookie attribute.
///
/// Set to `false` for plain-HTTP local development; browsers drop `Secure`
/// cookies served over HTTP.
pub const COOKIE_SECURE_ENV: &str = "COOKIE_SECURE";

/// Default data directory when `DATA_DIR` is unset.
pub const DEFAULT_DATA_DIR: &str = "/data";

/// Database file name under the data directory.
pub const DB_FILE_NAME: &str = "platform.redb";

/// Resolve the database file path from the environment.
pub fn database_path() -> PathBuf {
    let dir = std::env::var(DATA_DIR_ENV).unwrap_or_else(|_| DEFAULT_DATA_DIR.to_string());
    PathBuf::from(dir).join(DB_FILE_NAME)
}

/// Whether session cookies carry the `Secure` attribute.
///
/// Defaults to on; only an explicit opt-out disables it.
pub fn secure_cookies() -> bool {
    match std::env::var(COOKIE_SECURE_ENV) {
        Ok(value) => !matches!(value.to_lowercase().as_str(), "false" | "0" | "off"),
        Err(_) => true,
    }
}

/// Read the subscription-manager contract address from the environment.
///
/// Returns `None` when unset. An unparseable value is treated the same as
/// unset, with a warning, so a typo disables the subscription module instead
/// of letting writes through unverified.
pub fn subscription_manager_address() -> Option<Address> {
    let raw = std::env::var(SUBSCRIPTION_MANAGER_ENV).ok()?;
    match raw.parse::<Address>() {
        Ok(addr) => Some(addr),
        Err(e) => {
            tracing::warn!(
                value = %raw,
                error = %e,
                "Ignoring unparseable SUBSCRIPTION_MANAGER_ADDRESS"
            );
            None
        }
    }
}
