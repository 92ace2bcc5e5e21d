// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::{net::SocketAddr, process::ExitCode, sync::Arc};

use access_gate_server::{
    api::router,
    auth::{IdentityStore, InMemoryIdentityStore, InMemoryRevocationStore, Role, UserIdentity},
    config::{GateConfig, LogFormat},
    pruner::RevocationPruner,
    state::AppState,
};
use axum_server::{tls_rustls::RustlsConfig, Handle};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let config = match GateConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid configuration: {e}");
            return ExitCode::FAILURE;
        }
    };
    init_tracing(config.log_format);

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Server failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: GateConfig) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let identities = Arc::new(InMemoryIdentityStore::new());
    if let Some(seed) = &config.seed_admin {
        identities.upsert(
            UserIdentity::new(seed.user_id.clone(), Role::Admin),
            seed.totp_secret.clone(),
        )?;
        if seed.totp_secret.is_none() {
            warn!(
                user_id = %seed.user_id,
                "Seed admin has no TOTP secret and cannot reach admin routes"
            );
        }
        info!(user_id = %seed.user_id, "Seeded bootstrap admin");
    }
    let revocations = Arc::new(InMemoryRevocationStore::new());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let tls = config.tls.clone();
    let prune_interval = config.prune_interval;
    info!(
        environment = config.environment.label(),
        restricted = config.environment.is_restricted(),
        "Deployment classified"
    );

    let state = AppState::new(config, identities, revocations.clone())
        .map_err(|e| format!("failed to build metrics registry: {e}"))?;
    let app = router(state);

    let shutdown = CancellationToken::new();
    let pruner = RevocationPruner::new(revocations, prune_interval);
    let pruner_task = tokio::spawn(pruner.run(shutdown.clone()));

    let handle = Handle::new();
    tokio::spawn({
        let handle = handle.clone();
        let shutdown = shutdown.clone();
        async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "Failed to listen for shutdown signal");
                return;
            }
            info!("Shutdown signal received");
            shutdown.cancel();
            handle.graceful_shutdown(Some(std::time::Duration::from_secs(10)));
        }
    });

    match tls {
        Some(paths) => {
            rustls::crypto::ring::default_provider()
                .install_default()
                .map_err(|_| "Failed to install rustls crypto provider")?;
            let tls_config = RustlsConfig::from_pem_file(&paths.cert, &paths.key).await?;
            info!("Access gate listening on https://{addr} (docs at /docs)");
            axum_server::bind_rustls(addr, tls_config)
                .handle(handle)
                .serve(app.into_make_service())
                .await?;
        }
        None => {
            info!("Access gate listening on http://{addr} (docs at /docs)");
            axum_server::bind(addr)
                .handle(handle)
                .serve(app.into_make_service())
                .await?;
        }
    }

    shutdown.cancel();
    if let Err(e) = pruner_task.await {
        warn!(error = %e, "Revocation pruner task ended abnormally");
    }
    Ok(())
}
