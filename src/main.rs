// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 TheHFPV

use std::env;
use std::net::SocketAddr;

use thehfpv_server::api::router;
use thehfpv_server::auth::TokenService;
use thehfpv_server::config::{AppConfig, LOG_FORMAT_ENV};
use thehfpv_server::oauth::GoogleOAuth;
use thehfpv_server::state::AppState;
use thehfpv_server::storage::{DataStore, StoragePaths};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    init_tracing();

    // Configuration is loaded exactly once; a bad environment is fatal.
    let config = AppConfig::from_env().expect("invalid configuration");

    let mut storage = DataStore::new(StoragePaths::new(&config.data_dir));
    storage
        .initialize()
        .expect("failed to initialize the data directory");

    let tokens = TokenService::new(&config.jwt_secret, config.token_ttl);
    let mut state = AppState::new(storage, tokens).with_frontend_url(&config.frontend_url);

    match &config.google {
        Some(google) => {
            state = state.with_google(GoogleOAuth::new(
                &google.client_id,
                &google.client_secret,
                &google.redirect_uri,
            ));
            tracing::info!("google sign-in enabled");
        }
        None => tracing::warn!("google sign-in disabled (no client credentials configured)"),
    }

    let app = router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .expect("failed to parse bind address");

    tracing::info!(%addr, "TheHFPV account service listening (docs at /docs)");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("failed to bind");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server failed");
}

/// Structured logging: `LOG_FORMAT=json` for machines, pretty otherwise.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug"));

    let json = env::var(LOG_FORMAT_ENV)
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

/// Resolve on ctrl-c or SIGTERM so in-flight requests can drain.
async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(_) => std::future::pending().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    tracing::info!("shutdown signal received, draining requests");
}
