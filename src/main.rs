// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Patros Labs

use std::{env, net::SocketAddr};

use patros_server::api::router;
use patros_server::auth::SessionKeys;
use patros_server::config;
use patros_server::state::AppState;
use patros_server::storage::PlatformDb;

#[tokio::main]
async fn main() {
    init_tracing();

    let session_secret = env::var(config::SESSION_SECRET_ENV).unwrap_or_else(|_| {
        eprintln!("{} must be set", config::SESSION_SECRET_ENV);
        std::process::exit(1);
    });

    let db_path = config::database_path();
    let db = match PlatformDb::open(&db_path) {
        Ok(db) => db,
        Err(e) => {
            tracing::error!(path = %db_path.display(), error = %e, "Failed to open database");
            std::process::exit(1);
        }
    };
    tracing::info!(path = %db_path.display(), "Database opened");

    let subscription_manager = config::subscription_manager_address();
    match subscription_manager {
        Some(addr) => tracing::info!(contract = %addr, "Subscription module enabled"),
        None => tracing::warn!("No subscription-manager contract configured; subscription writes will return 503"),
    }

    let state = AppState::new(db, SessionKeys::new(session_secret.into_bytes()))
        .with_subscription_manager(subscription_manager);
    let app = router(state);

    let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = env::var("PORT")
        .unwrap_or_else(|_| "8080".to_string())
        .parse()
        .unwrap_or(8080);

    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .expect("Failed to parse bind address");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind");
    tracing::info!("Patros server listening on http://{addr} (docs at /docs)");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server failed");
}

/// Log as JSON when `LOG_FORMAT=json`, human-readable otherwise.
fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug"));

    let json = env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .pretty()
            .init();
    }
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    tracing::info!("Shutdown signal received");
}
