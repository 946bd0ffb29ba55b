// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::{net::SocketAddr, sync::Arc};

use carbonsense_server::{
    api::router,
    config::{AppConfig, LogFormat, UserStoreKind, DEFAULT_LOG_FILTER, JWT_SECRET_ENV},
    state::AppState,
    storage::{InMemoryUserStore, UserDatabase, UserStore},
};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());
    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

fn open_user_store(config: &AppConfig) -> Result<Arc<dyn UserStore>, Box<dyn std::error::Error>> {
    match config.user_store {
        UserStoreKind::Memory => {
            warn!("Using in-memory user store; users are lost on restart");
            Ok(Arc::new(InMemoryUserStore::new()))
        }
        UserStoreKind::Redb => {
            std::fs::create_dir_all(&config.data_dir)?;
            let db = UserDatabase::open_in(&config.data_dir).map_err(|e| {
                error!(data_dir = %config.data_dir.display(), "Failed to open user database: {}", e);
                e
            })?;
            info!(data_dir = %config.data_dir.display(), "User database opened");
            Ok(Arc::new(db))
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing(LogFormat::from_env());

    info!("Starting CarbonSense server");
    let config = AppConfig::from_env();

    if config.jwt_secret.is_none() {
        error!("{JWT_SECRET_ENV} is not set; every authenticated request will fail");
    }

    info!(
        bind_address = %config.bind_address(),
        jwt_leeway_secs = config.jwt_leeway_secs,
        user_store = ?config.user_store,
        "Configuration loaded"
    );

    let users = open_user_store(&config)?;
    let state = AppState::new(users, config.verifier_config());
    let app = router(state);

    let addr: SocketAddr = config.bind_address().parse().map_err(|e| {
        error!("Invalid bind address: {}", e);
        e
    })?;

    info!("CarbonSense server listening on http://{addr} (docs at /docs)");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Resolves on SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received SIGINT, shutting down"),
            Err(e) => error!("Failed to listen for SIGINT: {}", e),
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received SIGTERM, shutting down");
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
