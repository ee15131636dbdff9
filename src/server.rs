//! Admin Server
//!
//! Serves the admin API for a registry owned by the host application and
//! ties the registry's teardown to the server's lifecycle.
//!
//! # Startup Sequence (host side)
//! 1. `init_tracing()` unless the host installs its own subscriber
//! 2. `Config::from_env()` and `CacheRegistry::new(config)`
//! 3. Hand registry clones to the code that caches
//! 4. `serve(listener, registry, shutdown_signal())`
//!
//! When the shutdown future resolves the server stops accepting requests and
//! the registry is shut down.

use std::future::Future;
use std::net::SocketAddr;

use anyhow::Context;
use tokio::{net::TcpListener, signal};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::api::{create_router, AppState};
use crate::config::Config;
use crate::registry::CacheRegistry;

/// Installs the global tracing subscriber.
///
/// Defaults to "info" level, can be overridden with RUST_LOG env var.
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "campus_cache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Binds the admin listener on the configured port.
pub async fn bind(config: &Config) -> anyhow::Result<TcpListener> {
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))
}

/// Serves the admin API for `registry` until `shutdown` resolves, then shuts
/// the registry down.
pub async fn serve<F>(
    listener: TcpListener,
    registry: CacheRegistry,
    shutdown: F,
) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr().context("admin listener has no address")?;
    info!(
        caches = ?registry.names(),
        "Admin server listening on http://{}", addr
    );

    let app = create_router(AppState::new(registry.clone()));
    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .context("admin server failed");

    registry.shutdown();
    info!("Admin server shutdown complete");
    served
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }
}
