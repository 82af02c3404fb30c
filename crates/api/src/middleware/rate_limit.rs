//! Per-client rate limiting for the unauthenticated auth and guarantor form
//! endpoints.
//!
//! Clients are keyed by IP address. Behind a reverse proxy the first
//! `X-Forwarded-For` entry is used when `security.trust_proxy_headers` is set.

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{header, HeaderMap, HeaderValue, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::{
    clock::{Clock, DefaultClock},
    DefaultKeyedRateLimiter, Quota, RateLimiter,
};
use std::{net::SocketAddr, num::NonZeroU32, sync::Arc};

use crate::app::AppState;
use crate::error::ApiError;

/// Tracked clients beyond which idle limiters are pruned.
const PRUNE_THRESHOLD: usize = 10_000;

pub struct RateLimiterState {
    limiter: DefaultKeyedRateLimiter<String>,
    rate_limit_per_minute: u32,
    trust_proxy_headers: bool,
}

impl RateLimiterState {
    /// Returns `None` when `rate_limit_per_minute` is 0 (limiting disabled).
    pub fn new(rate_limit_per_minute: u32, trust_proxy_headers: bool) -> Option<Self> {
        let per_minute = NonZeroU32::new(rate_limit_per_minute)?;
        Some(Self {
            limiter: RateLimiter::keyed(Quota::per_minute(per_minute)),
            rate_limit_per_minute,
            trust_proxy_headers,
        })
    }

    /// Ok if `client` may proceed, otherwise the seconds to wait.
    pub fn check(&self, client: &str) -> Result<(), u64> {
        if self.limiter.len() > PRUNE_THRESHOLD {
            self.limiter.retain_recent();
        }

        self.limiter.check_key(&client.to_string()).map_err(|not_until| {
            not_until
                .wait_time_from(DefaultClock::default().now())
                .as_secs()
                .max(1)
        })
    }

    /// Identifies the caller of a request.
    pub fn client_key(&self, headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
        if self.trust_proxy_headers {
            let forwarded = headers
                .get("x-forwarded-for")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.split(',').next())
                .map(str::trim)
                .filter(|v| !v.is_empty());
            if let Some(ip) = forwarded {
                return ip.to_string();
            }
        }

        peer.map(|addr| addr.ip().to_string())
            .unwrap_or_else(|| "unknown".to_string())
    }
}

impl std::fmt::Debug for RateLimiterState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiterState")
            .field("rate_limit_per_minute", &self.rate_limit_per_minute)
            .field("tracked_clients", &self.limiter.len())
            .finish()
    }
}

/// Rejects callers that exceed `security.auth_rate_limit_per_minute` with 429.
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let Some(limiter) = state.rate_limiter.as_ref().map(Arc::clone) else {
        return next.run(req).await;
    };

    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0);
    let client = limiter.client_key(req.headers(), peer);

    match limiter.check(&client) {
        Ok(()) => next.run(req).await,
        Err(retry_after) => {
            tracing::warn!(client = %client, path = %req.uri().path(), "Rate limit exceeded");
            metrics::counter!("http_rate_limited_total").increment(1);
            rate_limited_response(limiter.rate_limit_per_minute, retry_after)
        }
    }
}

fn rate_limited_response(limit: u32, retry_after: u64) -> Response {
    let mut response = ApiError::TooManyRequests(format!(
        "Too many requests. The limit is {} per minute.",
        limit
    ))
    .into_response();
    response
        .headers_mut()
        .insert(header::RETRY_AFTER, HeaderValue::from(retry_after));
    response
}
