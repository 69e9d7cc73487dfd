// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Process wiring: build the gate and the router, bind, serve.

use std::sync::Arc;

use tokio::{net::TcpListener, signal};

use crate::{
    api::router,
    auth::{MountedServers, TokenGate},
    config::Config,
    error::ServerError,
    state::AppState,
};

/// Serve until Ctrl-C or SIGTERM.
///
/// Fails before binding if the initial key set cannot be downloaded.
pub async fn run(config: Config) -> Result<(), ServerError> {
    let mounted: MountedServers = config.mounted_servers.iter().collect();

    let gate = TokenGate::connect(&config.gate, mounted.clone()).await?;
    tracing::info!(
        jwks_url = %config.gate.jwks_url,
        keys = gate.keys().snapshot().await.len(),
        "Signing keys loaded"
    );

    let state = AppState::new(mounted, config.build.clone());
    let app = router(state, Arc::new(gate));

    let listener = TcpListener::bind(config.bind_addr).await?;
    tracing::info!(
        addr = %listener.local_addr()?,
        version = %config.build.version,
        "Agent builder server listening (docs at /docs)"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
