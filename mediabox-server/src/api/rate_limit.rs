//! Per-client-IP request limiting for `/api`

use axum::{
    extract::{ConnectInfo, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use governor::clock::DefaultClock;
use governor::state::keyed::DefaultKeyedStateStore;
use governor::{Quota, RateLimiter};
use serde_json::json;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::num::NonZeroU32;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, warn};

pub const RATE_LIMITED_MESSAGE: &str = "Too many requests, please try again later.";

pub type IpRateLimiter = RateLimiter<IpAddr, DefaultKeyedStateStore<IpAddr>, DefaultClock>;

/// Allow `max` requests per `window` for each client IP
///
/// The full allowance is available as a burst; capacity then refills evenly
/// over the window.
pub fn ip_limiter(max: u32, window: Duration) -> Arc<IpRateLimiter> {
    let burst = NonZeroU32::new(max).unwrap_or(NonZeroU32::MIN);
    let period = (window / burst.get()).max(Duration::from_nanos(1));
    let quota = Quota::with_period(period)
        .unwrap_or_else(|| Quota::per_second(burst))
        .allow_burst(burst);
    Arc::new(RateLimiter::keyed(quota))
}

/// Periodically forget clients whose allowance has fully refilled
///
/// Keeps the per-IP table from growing with every address ever seen. The
/// task ends once the limiter itself is dropped.
pub fn spawn_pruner(limiter: &Arc<IpRateLimiter>, every: Duration) -> JoinHandle<()> {
    let limiter: Weak<IpRateLimiter> = Arc::downgrade(limiter);
    let every = every.max(Duration::from_millis(1));

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(Instant::now() + every, every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            let Some(limiter) = limiter.upgrade() else {
                break;
            };
            limiter.retain_recent();
            limiter.shrink_to_fit();
            debug!("Rate limiter tracking {} clients", limiter.len());
        }
    })
}

/// Middleware rejecting requests over the limit with 429
///
/// Requests without connection info (e.g. in-process tests) share one bucket.
pub async fn limit_by_ip(
    State(limiter): State<Arc<IpRateLimiter>>,
    request: Request,
    next: Next,
) -> Response {
    let ip = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));

    if limiter.check_key(&ip).is_err() {
        warn!(%ip, path = %request.uri().path(), "Rate limit exceeded");
        return (
            StatusCode::TOO_MANY_REQUESTS,
            Json(json!({ "success": false, "message": RATE_LIMITED_MESSAGE })),
        )
            .into_response();
    }

    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_burst_then_reject_per_ip() {
        let limiter = ip_limiter(3, Duration::from_secs(900));
        let a: IpAddr = "10.0.0.1".parse().unwrap();
        let b: IpAddr = "10.0.0.2".parse().unwrap();

        for _ in 0..3 {
            assert!(limiter.check_key(&a).is_ok());
        }
        assert!(limiter.check_key(&a).is_err());
        assert!(limiter.check_key(&b).is_ok());
    }

    #[tokio::test]
    async fn test_pruner_forgets_refilled_clients_and_stops_with_limiter() {
        let limiter = ip_limiter(1, Duration::from_millis(20));
        let ip = IpAddr::V4(Ipv4Addr::LOCALHOST);
        assert!(limiter.check_key(&ip).is_ok());
        assert_eq!(limiter.len(), 1);

        let pruner = spawn_pruner(&limiter, Duration::from_millis(30));
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(limiter.len(), 0);

        drop(limiter);
        tokio::time::timeout(Duration::from_secs(2), pruner)
            .await
            .unwrap()
            .unwrap();
    }

    #[test]
    fn test_zero_max_still_allows_one() {
        let limiter = ip_limiter(0, Duration::from_secs(60));
        let ip = IpAddr::V4(Ipv4Addr::LOCALHOST);
        assert!(limiter.check_key(&ip).is_ok());
        assert!(limiter.check_key(&ip).is_err());
    }
}
