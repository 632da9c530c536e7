// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Patros Labs

//! Patros - Creator Platform Backend
//!
//! This crate provides the backend for a social/creator platform: wallet
//! signatures as the sole identity mechanism, user profiles, personal and
//! group chat relay, creator subscription tiers settled against an on-chain
//! contract, and per-user notification feeds.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - Wallet challenge flow, sessions, and role extractors
//! - `storage` - Embedded redb database and repositories
//! - `models` - Shared identity primitives (addresses, gender)

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod state;
pub mod storage;
