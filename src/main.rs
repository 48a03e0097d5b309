// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use axum_server::tls_rustls::RustlsConfig;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use pass_keeper::api::router;
use pass_keeper::auth::TokenManager;
use pass_keeper::cipher::EnvelopeCipher;
use pass_keeper::config::{LogFormat, ServerConfig, DEFAULT_LOG_FILTER};
use pass_keeper::state::AppState;
use pass_keeper::storage::{HealthMonitor, VaultDatabase};

#[tokio::main]
async fn main() {
    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid configuration: {e}");
            std::process::exit(1);
        }
    };

    init_tracing(config.log_format);

    if let Err(e) = run(config).await {
        error!(error = %e, "Server terminated");
        std::process::exit(1);
    }
}

fn init_tracing(format: LogFormat) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}

async fn run(config: ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    // Install the ring crypto provider for rustls (must be done before any TLS operations)
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        warn!("rustls crypto provider already installed");
    }

    let addr = config.bind_address()?;
    let db_path = config.database_path();
    info!(path = %db_path.display(), "Opening record store");
    let database = VaultDatabase::connect(&db_path, config.retry).await?;

    let tokens = TokenManager::new(config.jwt_secret.as_bytes(), config.token_ttl)?;
    let cipher = EnvelopeCipher::new(&config.crypto_key)?;
    let state = AppState::new(database, tokens, cipher);

    let shutdown = CancellationToken::new();
    let monitor = HealthMonitor::new(Arc::clone(&state.database))
        .with_interval(config.health_check_interval);
    let monitor_handle = tokio::spawn(monitor.run(shutdown.clone()));

    let app = router(state);

    let served = match &config.tls {
        Some(tls) => {
            let tls_config = RustlsConfig::from_pem_file(&tls.cert, &tls.key).await?;
            info!(%addr, "Pass Keeper listening on https (docs at /docs)");
            let server = axum_server::bind_rustls(addr, tls_config).serve(app.into_make_service());
            tokio::select! {
                result = server => result,
                _ = shutdown_signal() => Ok(()),
            }
        }
        None => {
            warn!("TLS_CERT_PATH/TLS_KEY_PATH not set, serving plain HTTP");
            let listener = tokio::net::TcpListener::bind(addr).await?;
            info!(%addr, "Pass Keeper listening on http (docs at /docs)");
            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown_signal())
                .await
        }
    };

    shutdown.cancel();
    if let Err(e) = monitor_handle.await {
        warn!(error = %e, "Health monitor task failed");
    }
    info!("Shutdown complete");
    served?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
