//! Avatar Studio HTTP server.
//!
//! Proxies the wizard's requests to the external generation services and
//! stores generated portraits under the media directory.

pub mod api;
pub mod api_avatar;
pub mod api_video;
pub mod config;
pub mod middleware;
pub mod retention;
pub mod store;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Extension, Json, Router,
};
use config::{Config, RateLimitConfig};
use middleware::RateLimiter;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;
use store::AvatarStore;
use studio_media::{AnimationRelay, ImageGateway};
use studio_voice::TtsService;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Portrait generation.
    pub gateway: Arc<ImageGateway>,
    /// Lip-sync animation.
    pub relay: Arc<AnimationRelay>,
    /// Speech synthesis.
    pub tts: Arc<TtsService>,
    /// Generated portraits.
    pub store: AvatarStore,
    /// Rate limiter state.
    pub rate_limiter: RateLimiter,
    /// Per-minute limits for the generation endpoints.
    pub limits: RateLimitConfig,
    /// Built web client to serve as a fallback, if any.
    pub client_dir: Option<PathBuf>,
}

impl AppState {
    /// Builds the service clients from configuration.
    pub fn from_config(config: &Config) -> Self {
        Self {
            gateway: Arc::new(ImageGateway::new(config.imagen.clone())),
            relay: Arc::new(AnimationRelay::new(config.animation.clone())),
            tts: Arc::new(TtsService::new(config.elevenlabs.clone())),
            store: AvatarStore::new(config.media.dir.clone()),
            rate_limiter: RateLimiter::new(),
            limits: config.rate_limit,
            client_dir: config.server.client_dir.clone(),
        }
    }
}

/// Maximum body size for the JSON endpoints (1 MiB).
const MAX_REQUEST_BODY_BYTES: usize = 1024 * 1024;

/// Health check handler.
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Builds the application router with all routes.
pub fn app(state: AppState) -> Router {
    // Video routes accept a portrait and an audio clip in one request.
    let video_routes = Router::new()
        .route(
            "/avatar/generate-talking-video",
            post(api_video::generate_talking_video_handler),
        )
        .route("/avatar/text-to-video", post(api_video::text_to_video_handler))
        .layer(DefaultBodyLimit::max(api_video::MAX_VIDEO_REQUEST_BYTES));

    let router = Router::new()
        .route("/health", get(health))
        .route("/avatar/health", get(api_avatar::health_handler))
        .route("/avatar/generate", post(api_avatar::generate_handler))
        .route(
            "/avatar/configurations",
            get(api_avatar::configurations_handler),
        )
        .route("/avatar/voices", get(api_avatar::voices_handler))
        .route("/avatar/avatars", get(api_avatar::avatars_handler))
        .route("/avatar/speech", post(api_avatar::speech_handler))
        .merge(video_routes);

    let media_dir = state.store.media_dir().to_path_buf();
    tracing::info!(path = %media_dir.display(), "serving generated media at /media");
    let router = router.nest_service("/media", ServeDir::new(&media_dir));

    let router = match &state.client_dir {
        Some(client_dir) if client_dir.join("index.html").exists() => {
            tracing::info!(path = %client_dir.display(), "serving client static files");
            router.fallback_service(
                ServeDir::new(client_dir).fallback(ServeFile::new(client_dir.join("index.html"))),
            )
        }
        Some(client_dir) => {
            tracing::info!(path = %client_dir.display(), "client directory has no index.html, skipping static file serving");
            router
        }
        None => router,
    };

    router
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY_BYTES))
        .layer(axum::middleware::from_fn(middleware::rate_limit_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(Extension(Arc::new(state)))
}
