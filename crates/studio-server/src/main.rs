//! Avatar Studio server binary.
//!
//! Starts the axum HTTP server with structured logging and graceful shutdown
//! on SIGTERM/SIGINT.

use std::net::SocketAddr;
use studio_server::{app, config, retention::start_retention_task, AppState};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

fn resolve_config_path() -> (Option<String>, &'static str) {
    if let Some(path) = std::env::args()
        .nth(1)
        .filter(|value| !value.trim().is_empty())
    {
        return (Some(path), "cli-arg");
    }

    if let Ok(path) = std::env::var("STUDIO_CONFIG_PATH") {
        if !path.trim().is_empty() {
            return (Some(path), "env-var");
        }
    }

    (None, "default")
}

#[tokio::main]
async fn main() {
    let (resolved_config_path, config_source) = resolve_config_path();
    let selected_config_path = resolved_config_path.as_deref().or(Some("config.toml"));

    let config = config::load_config(selected_config_path)
        .expect("failed to load configuration; the server cannot start without valid config");

    let filter =
        EnvFilter::try_new(&config.logging.level).unwrap_or_else(|_| EnvFilter::new("info"));

    if config.logging.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    tracing::info!(
        source = config_source,
        path = selected_config_path.unwrap_or("<none>"),
        "resolved startup configuration path"
    );
    tracing::info!(
        imagen = ?config.imagen,
        elevenlabs = ?config.elevenlabs,
        animation = ?config.animation,
        "external service configuration"
    );

    let state = AppState::from_config(&config);
    if !state.gateway.is_configured() {
        tracing::warn!("GEMINI_API_KEY is not set; avatar generation will fail until it is");
    }
    if !state.tts.is_configured() {
        tracing::warn!("ELEVENLABS_API_KEY is not set; speech synthesis will fail until it is");
    }
    if !state.relay.is_configured() {
        tracing::warn!(
            mode = state.relay.mode().as_str(),
            "animation service is not configured; video generation will fail until it is"
        );
    }

    if let Err(e) = tokio::fs::create_dir_all(&config.media.dir).await {
        tracing::warn!(path = %config.media.dir.display(), error = %e, "could not create media directory");
    }

    match config.media.retention() {
        Some(max_age) => {
            tokio::spawn(start_retention_task(
                state.store.clone(),
                max_age,
                config.media.retention_sweep_secs,
            ));
        }
        None => tracing::info!("portrait retention disabled; stored portraits are kept"),
    }

    let app = app(state);
    let addr = SocketAddr::new(config.server.host, config.server.port);

    tracing::info!(%addr, "starting avatar studio server");

    let listener = TcpListener::bind(addr)
        .await
        .expect("failed to bind to address; is another process using this port?");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .expect("server error");

    tracing::info!("avatar studio server shut down");
}

/// Waits for a SIGINT (Ctrl+C) or SIGTERM signal for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => { tracing::info!("received SIGINT, initiating graceful shutdown"); }
        () = terminate => { tracing::info!("received SIGTERM, initiating graceful shutdown"); }
    }
}
