//! Proxy callback and single sign-out server.

use std::net::SocketAddr;

use axum::Router;
use cas_protocol::endpoints::{cas_router, CasState};
use cas_protocol::CasClient;
use tokio::net::TcpListener;

use crate::output::info;

/// Serves the proxy callback and single sign-out endpoints until interrupted.
pub async fn run_serve_callback<T>(client: T, bind: SocketAddr, logout_path: &str) -> crate::CliResult<()>
where
    T: CasClient + Clone + 'static,
{
    let callback_path = client.properties().callback_path().to_string();
    let app: Router = cas_router(&callback_path, logout_path).with_state(CasState::new(client));

    let listener = TcpListener::bind(bind).await?;
    let addr = listener.local_addr()?;
    info(&format!("Proxy callback: http://{addr}{callback_path}"));
    info(&format!("Single sign-out: http://{addr}{logout_path}"));
    tracing::info!(%addr, "CAS callback server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("CAS callback server stopped");
    Ok(())
}

/// Waits for a shutdown signal.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install signal handler");
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

    tracing::info!("Shutdown signal received");
}
