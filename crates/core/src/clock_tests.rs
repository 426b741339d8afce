use super::*;

#[test]
fn fake_clock_starts_at_epoch() {
    let clock = FakeClock::new();
    assert_eq!(clock.epoch_ms(), 0);
}

#[test]
fn fake_clock_advances() {
    let clock = FakeClock::new();
    clock.advance(chrono::Duration::seconds(30));
    assert_eq!(clock.epoch_ms(), 30_000);
}

#[test]
fn fake_clock_set_is_absolute() {
    let clock = FakeClock::new();
    clock.advance(chrono::Duration::seconds(30));
    clock.set(5_000);
    assert_eq!(clock.epoch_ms(), 5_000);
}

#[test]
fn system_clock_is_monotonic_nondecreasing() {
    let clock = SystemClock;
    let a = clock.now();
    let b = clock.now();
    assert!(b >= a);
}
