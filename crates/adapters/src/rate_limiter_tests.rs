use super::*;
use std::time::Instant;

#[tokio::test]
async fn burst_capacity_is_available_immediately() {
    let limiter = TokenBucketRateLimiter::new(RateLimitConfig {
        refill_per_sec: 1.0,
        burst: 3,
        random_delay_ms: 0,
    });
    let cancel = CancelToken::new();
    let start = Instant::now();
    for _ in 0..3 {
        limiter.acquire("example.com", &cancel).await.expect("token");
    }
    assert!(start.elapsed() < Duration::from_millis(200));
}

#[tokio::test]
async fn exhausted_bucket_waits_for_refill() {
    let limiter = TokenBucketRateLimiter::new(RateLimitConfig {
        refill_per_sec: 10.0,
        burst: 1,
        random_delay_ms: 0,
    });
    let cancel = CancelToken::new();
    limiter.acquire("example.com", &cancel).await.expect("first token");
    let start = Instant::now();
    limiter.acquire("example.com", &cancel).await.expect("second token");
    assert!(start.elapsed() >= Duration::from_millis(50));
}

#[tokio::test]
async fn hosts_are_independent() {
    let limiter = TokenBucketRateLimiter::new(RateLimitConfig {
        refill_per_sec: 1.0,
        burst: 1,
        random_delay_ms: 0,
    });
    let cancel = CancelToken::new();
    limiter.acquire("a.example.com", &cancel).await.expect("a token");
    let start = Instant::now();
    limiter.acquire("b.example.com", &cancel).await.expect("b token");
    assert!(start.elapsed() < Duration::from_millis(200));
}

#[tokio::test]
async fn cancellation_interrupts_a_wait() {
    let limiter = TokenBucketRateLimiter::new(RateLimitConfig {
        refill_per_sec: 0.1,
        burst: 1,
        random_delay_ms: 0,
    });
    let cancel = CancelToken::new();
    limiter.acquire("example.com", &cancel).await.expect("first token");

    let waiter_cancel = cancel.clone();
    let handle = tokio::spawn(async move { limiter.acquire("example.com", &waiter_cancel).await });
    tokio::time::sleep(Duration::from_millis(20)).await;
    cancel.cancel();
    let result = handle.await.expect("task panicked");
    assert!(matches!(result, Err(ScrapeError::RateLimitCancelled(_))));
}

#[tokio::test]
async fn noop_limiter_never_waits() {
    let limiter = NoopRateLimiter;
    let cancel = CancelToken::new();
    let start = Instant::now();
    for _ in 0..100 {
        limiter.acquire("example.com", &cancel).await.expect("token");
    }
    assert!(start.elapsed() < Duration::from_millis(50));
}
