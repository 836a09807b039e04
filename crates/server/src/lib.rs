//! devtunnel server: exposes `GET /api/webhook-url`, which reports whether a
//! development ngrok tunnel is available and the webhook URL it yields.

pub mod app;
pub mod config;
pub mod error;
pub mod resolver;
pub mod telemetry;
pub mod tunnel;

use crate::app::AppState;
use crate::config::ServerArgs;
use crate::error::Result;
use crate::tunnel::{LazyTunnelProvider, NgrokAgentProvider, TunnelProvider};
use devtunnel_feature_gate::{ConfigSource, ProcessEnv};
use std::sync::Arc;
use tokio::net::TcpListener;

/// Builds the production state: process environment as configuration and an
/// ngrok agent provider that is only constructed on first use.
#[must_use]
pub fn build_state(args: &ServerArgs) -> AppState {
    let config: Arc<dyn ConfigSource> = Arc::new(ProcessEnv);
    let settings = args.ngrok_settings();
    let provider_config = Arc::clone(&config);
    let tunnels = LazyTunnelProvider::new(move || {
        let provider = NgrokAgentProvider::new(settings.clone(), Arc::clone(&provider_config))?;
        Ok(Arc::new(provider) as Arc<dyn TunnelProvider>)
    });
    AppState { config, tunnels }
}

/// Binds `args.bind` and serves until Ctrl-C or SIGTERM.
///
/// # Errors
///
/// Returns an error if the listener cannot be bound or the server fails.
pub async fn run(args: ServerArgs) -> Result<()> {
    let app = app::router(build_state(&args));
    let listener = TcpListener::bind(args.bind).await?;
    tracing::info!(addr = %listener.local_addr()?, "devtunnel listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("devtunnel stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    tracing::info!("shutdown signal received");
}
