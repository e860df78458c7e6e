//! Rate limiting middleware using token bucket algorithm
//!
//! Applied to public write endpoints (ratings and reviews), which accept
//! anonymous submissions. Each client IP gets its own bucket.

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};
use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};
use pdfhub_common::config::RateLimitConfig;
use pdfhub_common::errors::{AppError, Result};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::num::NonZeroU32;
use std::sync::Arc;

/// Buckets kept before idle ones are pruned
const MAX_TRACKED_CLIENTS: usize = 10_000;

/// Per-client limiter plus the configured rate, reported back on rejection
#[derive(Clone)]
pub struct PublicWriteLimiter {
    limiter: Arc<DefaultKeyedRateLimiter<IpAddr>>,
    requests_per_second: u32,
}

impl PublicWriteLimiter {
    /// `None` when limiting is disabled
    pub fn from_config(config: &RateLimitConfig) -> Option<Self> {
        if !config.enabled {
            return None;
        }
        Some(Self::new(config.requests_per_second, config.burst))
    }

    /// Zero values are clamped to one
    pub fn new(requests_per_second: u32, burst: u32) -> Self {
        let rate = NonZeroU32::new(requests_per_second).unwrap_or(NonZeroU32::MIN);
        let burst = NonZeroU32::new(burst).unwrap_or(rate);
        let quota = Quota::per_second(rate).allow_burst(burst);

        Self {
            limiter: Arc::new(RateLimiter::keyed(quota)),
            requests_per_second: rate.get(),
        }
    }

    fn check(&self, client: IpAddr) -> bool {
        if self.limiter.len() > MAX_TRACKED_CLIENTS {
            self.limiter.retain_recent();
        }
        self.limiter.check_key(&client).is_ok()
    }
}

/// Peer address recorded by the server; requests without one share a bucket
fn client_ip(request: &Request) -> IpAddr {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
}

/// Rate limiting middleware
pub async fn rate_limit_middleware(
    State(limiter): State<PublicWriteLimiter>,
    request: Request,
    next: Next,
) -> Result<Response> {
    let client = client_ip(&request);
    if limiter.check(client) {
        return Ok(next.run(request).await);
    }

    tracing::warn!(path = %request.uri().path(), client = %client, "Rate limit exceeded");
    Err(AppError::RateLimited {
        limit: limiter.requests_per_second,
    })
}
