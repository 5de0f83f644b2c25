/// Rate limiting middleware for the `/api` routes
///
/// This module implements token bucket rate limiting with process-local
/// state. Each client gets a bucket of `RATE_LIMIT_REQUESTS` tokens that
/// refills evenly over `RATE_LIMIT_WINDOW_SECS`.
///
/// # Client Identity
///
/// Clients are keyed by the first address in `X-Forwarded-For` when present
/// (the API usually runs behind a proxy), otherwise by the socket peer
/// address. Requests with neither share one `unknown` bucket.
///
/// # Algorithm
///
/// Uses token bucket algorithm:
/// - Tokens refill at constant rate
/// - Each request consumes 1 token
/// - Request blocked if bucket empty
///
/// # Headers
///
/// Response includes rate limit headers:
/// - `X-RateLimit-Limit`: Bucket capacity
/// - `X-RateLimit-Remaining`: Tokens remaining
/// - `X-RateLimit-Reset`: Seconds until the bucket is full again
/// - `Retry-After`: Seconds to wait (429 responses only)

use crate::app::AppState;
use crate::config::RateLimitConfig;
use crate::error::ApiError;
use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Mutex;
use std::time::Instant;

/// Buckets kept before idle, fully refilled ones are evicted
const MAX_TRACKED_CLIENTS: usize = 10_000;

/// Token bucket state for one client
#[derive(Debug, Clone)]
struct TokenBucket {
    /// Current number of tokens
    tokens: f64,

    /// Last refill time
    last_refill: Instant,
}

impl TokenBucket {
    /// Creates a new full bucket
    fn new(capacity: u32, now: Instant) -> Self {
        TokenBucket {
            tokens: f64::from(capacity),
            last_refill: now,
        }
    }

    /// Refills tokens based on elapsed time
    fn refill(&mut self, rate: f64, capacity: u32, now: Instant) {
        let elapsed_secs = now.saturating_duration_since(self.last_refill).as_secs_f64();

        self.tokens = (self.tokens + elapsed_secs * rate).min(f64::from(capacity));
        self.last_refill = now;
    }

    /// Attempts to consume one token
    fn try_consume(&mut self) -> bool {
        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    /// Calculates seconds until `target` tokens are available
    fn seconds_until(&self, target: f64, rate: f64) -> u64 {
        let deficit = target - self.tokens;
        if deficit <= 0.0 {
            0
        } else {
            (deficit / rate).ceil() as u64
        }
    }
}

/// Result of rate limit check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitResult {
    /// Whether request is allowed
    pub ok: bool,

    /// Bucket capacity
    pub limit: u32,

    /// Tokens remaining
    pub remaining: u32,

    /// Seconds until the bucket is full
    pub reset_after: u64,

    /// Seconds until the next request would be allowed (0 when allowed)
    pub retry_after: u64,
}

/// In-memory per-client token buckets
#[derive(Debug)]
pub struct RateLimiter {
    capacity: u32,

    /// Token refill rate (tokens per second)
    refill_rate: f64,

    buckets: Mutex<HashMap<String, TokenBucket>>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            capacity: config.requests,
            refill_rate: f64::from(config.requests) / config.window_secs as f64,
            buckets: Mutex::new(HashMap::new()),
        }
    }

    /// Takes one token from `client`'s bucket
    pub fn check(&self, client: &str) -> RateLimitResult {
        self.check_at(client, Instant::now())
    }

    /// Same as [`RateLimiter::check`] at an explicit instant
    pub fn check_at(&self, client: &str, now: Instant) -> RateLimitResult {
        // The map stays consistent even if a holder panicked
        let mut buckets = self
            .buckets
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if buckets.len() >= MAX_TRACKED_CLIENTS && !buckets.contains_key(client) {
            self.evict_full(&mut buckets, now);
        }

        let bucket = buckets
            .entry(client.to_string())
            .or_insert_with(|| TokenBucket::new(self.capacity, now));
        bucket.refill(self.refill_rate, self.capacity, now);
        let ok = bucket.try_consume();

        RateLimitResult {
            ok,
            limit: self.capacity,
            remaining: bucket.tokens.floor() as u32,
            reset_after: bucket.seconds_until(f64::from(self.capacity), self.refill_rate),
            retry_after: if ok {
                0
            } else {
                bucket.seconds_until(1.0, self.refill_rate).max(1)
            },
        }
    }

    /// Drops buckets that have refilled completely; they carry no state
    fn evict_full(&self, buckets: &mut HashMap<String, TokenBucket>, now: Instant) {
        let before = buckets.len();
        buckets.retain(|_, bucket| {
            bucket.refill(self.refill_rate, self.capacity, now);
            bucket.tokens < f64::from(self.capacity)
        });
        tracing::debug!(evicted = before - buckets.len(), "Evicted idle rate limit buckets");
    }
}

/// Identifies the client for rate limiting
pub fn client_key(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|addr| !addr.is_empty())
        .map(str::to_string)
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
        .unwrap_or_else(|| "unknown".to_string())
}

/// Rate limiting middleware layer
///
/// Checks rate limits before processing requests. Returns 429 if exceeded.
pub async fn rate_limit_layer(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let client = client_key(request.headers(), peer);
    let result = state.rate_limiter.check(&client);

    let mut response = if result.ok {
        next.run(request).await
    } else {
        tracing::warn!(client = %client, retry_after = result.retry_after, "Rate limit exceeded");
        create_rate_limit_error(result).into_response()
    };

    let headers = response.headers_mut();
    headers.insert("X-RateLimit-Limit", HeaderValue::from(result.limit));
    headers.insert("X-RateLimit-Remaining", HeaderValue::from(result.remaining));
    headers.insert("X-RateLimit-Reset", HeaderValue::from(result.reset_after));

    response
}

/// Creates a rate limit exceeded error response
fn create_rate_limit_error(result: RateLimitResult) -> ApiError {
    ApiError::RateLimitExceeded {
        retry_after: result.retry_after,
        message: "Too many requests from this IP, please try again later.".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn limiter(requests: u32, window_secs: u64) -> RateLimiter {
        RateLimiter::new(RateLimitConfig {
            requests,
            window_secs,
        })
    }

    #[test]
    fn test_bucket_exhausts_and_refills() {
        let limiter = limiter(4, 8);
        let start = Instant::now();

        for expected_remaining in [3, 2, 1, 0] {
            let result = limiter.check_at("1.2.3.4", start);
            assert!(result.ok);
            assert_eq!(result.remaining, expected_remaining);
        }

        let blocked = limiter.check_at("1.2.3.4", start);
        assert!(!blocked.ok);
        // One token every 2 seconds
        assert_eq!(blocked.retry_after, 2);
        assert_eq!(blocked.reset_after, 8);

        let later = limiter.check_at("1.2.3.4", start + Duration::from_secs(2));
        assert!(later.ok);
    }

    #[test]
    fn test_clients_are_independent() {
        let limiter = limiter(1, 60);
        let now = Instant::now();

        assert!(limiter.check_at("a", now).ok);
        assert!(!limiter.check_at("a", now).ok);
        assert!(limiter.check_at("b", now).ok);
    }

    #[test]
    fn test_refill_caps_at_capacity() {
        let limiter = limiter(2, 10);
        let start = Instant::now();
        limiter.check_at("a", start);

        let result = limiter.check_at("a", start + Duration::from_secs(3600));
        assert!(result.ok);
        assert_eq!(result.remaining, 1);
    }

    #[test]
    fn test_client_key() {
        let peer: SocketAddr = "10.0.0.7:5555".parse().unwrap();

        let mut headers = HeaderMap::new();
        assert_eq!(client_key(&headers, None), "unknown");
        assert_eq!(client_key(&headers, Some(peer)), "10.0.0.7");

        headers.insert("x-forwarded-for", HeaderValue::from_static("203.0.113.9, 10.0.0.1"));
        assert_eq!(client_key(&headers, Some(peer)), "203.0.113.9");
    }
}
