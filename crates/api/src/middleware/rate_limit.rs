//! Per-client fixed-window rate limiting.

use std::collections::HashMap;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use axum::extract::{ConnectInfo, FromRequestParts, Request, State};
use axum::http::request::Parts;
use axum::http::{Extensions, HeaderMap};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::error::AppError;
use crate::state::AppState;

/// Paths never counted against the limit.
const EXEMPT_PATHS: [&str; 1] = ["/health"];

/// Tracked clients above which idle windows are pruned.
const PRUNE_THRESHOLD: usize = 10_000;

/// Windows idle for this many window lengths are dropped on a prune.
const PRUNE_AFTER_WINDOWS: u32 = 2;

#[derive(Debug, Clone, Copy)]
struct Window {
    started_at: Instant,
    count: u32,
}

/// Fixed-window request counters keyed by client address.
#[derive(Debug)]
pub struct RateLimiter {
    max_requests: u32,
    window: Duration,
    clients: Mutex<HashMap<String, Window>>,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            clients: Mutex::new(HashMap::new()),
        }
    }

    /// Count a request from `client` at `now`.
    ///
    /// Returns `Err(retry_after_secs)` when the client is over the limit.
    pub fn check(&self, client: &str, now: Instant) -> Result<(), u64> {
        let mut clients = self.clients.lock().unwrap_or_else(|e| e.into_inner());

        if clients.len() > PRUNE_THRESHOLD {
            let idle = self.window * PRUNE_AFTER_WINDOWS;
            clients.retain(|_, w| now.duration_since(w.started_at) < idle);
        }

        let window = clients.entry(client.to_string()).or_insert(Window {
            started_at: now,
            count: 0,
        });
        if now.duration_since(window.started_at) >= self.window {
            *window = Window {
                started_at: now,
                count: 0,
            };
        }

        if window.count >= self.max_requests {
            let remaining = self.window.saturating_sub(now.duration_since(window.started_at));
            return Err(remaining.as_secs().max(1));
        }
        window.count += 1;
        Ok(())
    }
}

/// Client address: first `X-Forwarded-For` hop, else the socket address.
fn client_address(headers: &HeaderMap, extensions: &Extensions) -> Option<String> {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());
    if let Some(ip) = forwarded {
        return Some(ip.to_string());
    }
    extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
}

fn client_key(request: &Request) -> String {
    client_address(request.headers(), request.extensions()).unwrap_or_else(|| "unknown".to_string())
}

/// The caller's address as seen by the rate limiter, if known.
#[derive(Debug, Clone)]
pub struct ClientIp(pub Option<String>);

impl<S: Send + Sync> FromRequestParts<S> for ClientIp {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(ClientIp(client_address(&parts.headers, &parts.extensions)))
    }
}

/// Axum middleware rejecting over-limit clients with 429.
pub async fn enforce(State(state): State<AppState>, request: Request, next: Next) -> Response {
    if EXEMPT_PATHS.contains(&request.uri().path()) {
        return next.run(request).await;
    }

    let client = client_key(&request);
    match state.rate_limiter.check(&client, Instant::now()) {
        Ok(()) => next.run(request).await,
        Err(retry_after_secs) => {
            tracing::warn!(client = %client, path = %request.uri().path(), "Rate limit exceeded");
            AppError::RateLimited { retry_after_secs }.into_response()
        }
    }
}
