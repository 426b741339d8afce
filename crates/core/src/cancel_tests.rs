use super::*;

#[tokio::test]
async fn cancelled_resolves_immediately_when_already_cancelled() {
    let token = CancelToken::new();
    token.cancel();
    assert!(token.is_cancelled());
    token.cancelled().await;
}

#[tokio::test]
async fn cancelled_wakes_a_pending_waiter() {
    let token = CancelToken::new();
    let waiter = token.clone();
    let handle = tokio::spawn(async move {
        waiter.cancelled().await;
    });
    assert!(!token.is_cancelled());
    token.cancel();
    handle.await.expect("waiter task panicked");
}

#[test]
fn clones_share_cancellation_state() {
    let token = CancelToken::new();
    let clone = token.clone();
    clone.cancel();
    assert!(token.is_cancelled());
}
