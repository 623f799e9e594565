use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{header, HeaderValue, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::AppState;

const WINDOW: Duration = Duration::from_secs(60);

/// Group of endpoints sharing one limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteClass {
    /// Portrait and speech generation.
    Generate,
    /// Talking-head video generation.
    Video,
}

impl RouteClass {
    /// Classifies a request path; `None` for unlimited endpoints.
    pub fn for_path(path: &str) -> Option<Self> {
        match path {
            "/avatar/generate" | "/avatar/speech" => Some(Self::Generate),
            "/avatar/generate-talking-video" | "/avatar/text-to-video" => Some(Self::Video),
            _ => None,
        }
    }
}

/// Rate limiting key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RateLimitKey {
    pub class: RouteClass,
    pub ip: IpAddr,
}

/// In-memory rate limiter state.
///
/// Uses a simple fixed window counter.
#[derive(Clone, Debug)]
pub struct RateLimiter {
    state: Arc<Mutex<HashMap<RateLimitKey, (u32, Instant)>>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Check if the request is allowed.
    ///
    /// Returns `true` if allowed, `false` if limit exceeded.
    pub fn check(&self, key: RateLimitKey, limit: u32) -> bool {
        let mut state = match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                tracing::error!("rate limiter lock poisoned, recovering with stale state");
                poisoned.into_inner()
            }
        };
        let now = Instant::now();

        // Evict expired windows only; active limits survive the sweep.
        if state.len() > 10000 {
            state.retain(|_, (_, start)| now.duration_since(*start) <= WINDOW);
        }

        let (count, start) = state.entry(key).or_insert((0, now));

        if now.duration_since(*start) > WINDOW {
            *count = 1;
            *start = now;
            true
        } else {
            *count += 1;
            *count <= limit
        }
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

/// Rate limiting middleware for the generation endpoints.
pub async fn rate_limit_middleware(req: Request<Body>, next: Next) -> Result<Response, StatusCode> {
    let Some(class) = RouteClass::for_path(req.uri().path()) else {
        return Ok(next.run(req).await);
    };

    let state = req
        .extensions()
        .get::<Arc<AppState>>()
        .ok_or(StatusCode::INTERNAL_SERVER_ERROR)?
        .clone();

    let ip = match req.extensions().get::<ConnectInfo<SocketAddr>>() {
        Some(ConnectInfo(addr)) => addr.ip(),
        None => {
            tracing::debug!("no peer address on request, using shared rate limit bucket");
            IpAddr::V4(Ipv4Addr::UNSPECIFIED)
        }
    };

    let limit = match class {
        RouteClass::Generate => state.limits.generate_per_minute,
        RouteClass::Video => state.limits.video_per_minute,
    };

    if !state.rate_limiter.check(RateLimitKey { class, ip }, limit) {
        tracing::info!(%ip, ?class, limit, "rate limit exceeded");
        let mut response = (
            StatusCode::TOO_MANY_REQUESTS,
            Json(json!({
                "success": false,
                "message": "too many generation requests, try again in a minute"
            })),
        )
            .into_response();
        response
            .headers_mut()
            .insert(header::RETRY_AFTER, HeaderValue::from_static("60"));
        return Ok(response);
    }

    Ok(next.run(req).await)
}
