use anyhow::{Context, Result};
use axum::{BoxError, Router, error_handling::HandleErrorLayer, response::IntoResponse};
use tokio::net::TcpListener;
use tower::{ServiceBuilder, timeout::TimeoutLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::{app_error::AppError, config::ServerConfig};

/// Loads `.env` if present. A missing file is not an error.
pub fn init_env() {
    if let Err(err) = dotenvy::dotenv() {
        if !err.not_found() {
            eprintln!("Failed to load .env: {err}");
        }
    }
}

pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn handle_middleware_error(err: BoxError) -> impl IntoResponse {
    if err.is::<tower::timeout::error::Elapsed>() {
        AppError::Other(anyhow::anyhow!("Request exceeded the server deadline"))
    } else {
        AppError::Other(anyhow::anyhow!("Unhandled middleware error: {err}"))
    }
}

/// Wraps the router with request tracing and the server-level deadline.
pub fn with_middleware(app: Router, config: &ServerConfig) -> Router {
    app.layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(HandleErrorLayer::new(handle_middleware_error))
            .layer(TimeoutLayer::new(config.request_timeout)),
    )
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!("Failed to listen for SIGTERM: {}", err);
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

/// Binds the listener and serves `app` until a shutdown signal arrives.
pub async fn serve(service_name: &str, app: Router, config: &ServerConfig) -> Result<()> {
    let addr = config.addr()?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    tracing::info!("{} listening on {}", service_name, addr);
    axum::serve(listener, with_middleware(app, config))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("{} stopped", service_name);
    Ok(())
}
