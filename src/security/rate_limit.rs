//! Per-client fixed-window rate limiting.
//!
//! Clients are keyed by IP. Behind `trusted_proxy_hops` reverse proxies the
//! IP is taken from `X-Forwarded-For`, walking right to left past the
//! trusted hops. Unparseable entries are skipped.

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use dashmap::DashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::schema::RateLimitConfig;
use crate::http::response::ApiError;
use crate::observability::metrics;

const X_FORWARDED_FOR: &str = "x-forwarded-for";

/// Windows kept before expired ones are swept.
const SWEEP_THRESHOLD: usize = 10_000;

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

/// Verdict for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allowed { remaining: u32 },
    Limited { retry_after: Duration },
}

/// State for the rate limiter.
pub struct RateLimiterState {
    windows: DashMap<String, Window>,
    window: Duration,
    max_requests: u32,
    trusted_proxy_hops: usize,
}

impl RateLimiterState {
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            windows: DashMap::new(),
            window: Duration::from_millis(config.window_ms),
            max_requests: config.max_requests,
            trusted_proxy_hops: config.trusted_proxy_hops,
        }
    }

    pub fn check(&self, key: &str) -> Decision {
        self.check_at(key, Instant::now())
    }

    fn check_at(&self, key: &str, now: Instant) -> Decision {
        if self.windows.len() > SWEEP_THRESHOLD {
            self.sweep(now);
        }

        let mut entry = self.windows.entry(key.to_string()).or_insert(Window {
            started: now,
            count: 0,
        });

        if now.duration_since(entry.started) >= self.window {
            *entry = Window { started: now, count: 0 };
        }

        if entry.count >= self.max_requests {
            let retry_after = self.window.saturating_sub(now.duration_since(entry.started));
            return Decision::Limited { retry_after };
        }

        entry.count += 1;
        Decision::Allowed {
            remaining: self.max_requests - entry.count,
        }
    }

    /// Drop windows that have already expired.
    fn sweep(&self, now: Instant) {
        let window = self.window;
        self.windows
            .retain(|_, w| now.duration_since(w.started) < window);
    }
}

/// Rate-limit key for `request`: the peer IP, or a forwarded client IP when
/// proxies are trusted. `"unknown"` when the peer address is not available.
fn client_key<B>(request: &Request<B>, trusted_proxy_hops: usize) -> String {
    let Some(ConnectInfo(peer)) = request.extensions().get::<ConnectInfo<SocketAddr>>() else {
        return "unknown".to_string();
    };

    if trusted_proxy_hops == 0 {
        return peer.ip().to_string();
    }

    let forwarded: Vec<IpAddr> = request
        .headers()
        .get_all(X_FORWARDED_FOR)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .filter_map(|hop| hop.trim().parse().ok())
        .collect();

    let skip = trusted_proxy_hops.min(forwarded.len());
    if skip == 0 {
        peer.ip().to_string()
    } else {
        forwarded[forwarded.len() - skip].to_string()
    }
}

/// Middleware function for per-IP rate limiting.
pub async fn rate_limit_middleware(
    State(state): State<Arc<RateLimiterState>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let key = client_key(&request, state.trusted_proxy_hops);

    match state.check(&key) {
        Decision::Allowed { .. } => next.run(request).await,
        Decision::Limited { retry_after } => {
            tracing::warn!(client = %key, "Rate limit exceeded");
            metrics::record_rate_limited();
            ApiError::too_many_requests("Too many requests from this IP, please try again later.")
                .at(request.uri().path())
                .retry_after(retry_after)
                .into_response()
        }
    }
}
