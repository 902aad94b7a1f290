//! Retry Integration Tests
//!
//! Exercises the backoff law through the public API, recording delays
//! instead of sleeping.

use std::cell::Cell;
use std::time::Duration;

use gtd::core::{retry, retry_with_sleep, with_retry, Config, RetryPolicy};

#[derive(Debug, PartialEq, Eq)]
struct ServiceError(&'static str);

fn secs(values: &[u64]) -> Vec<Duration> {
    values.iter().copied().map(Duration::from_secs).collect()
}

#[test]
fn test_backoff_law() {
    let policy = RetryPolicy::new(Duration::from_secs(1), Duration::from_secs(60), 5);
    let calls = Cell::new(0u32);
    let mut slept = Vec::new();

    let outcome = retry_with_sleep(
        &policy,
        |d| slept.push(d),
        || -> Result<(), ServiceError> {
            calls.set(calls.get() + 1);
            Err(ServiceError("503 Service Unavailable"))
        },
    );

    assert_eq!(calls.get(), 6);
    assert_eq!(outcome.attempts, 6);
    assert_eq!(slept, secs(&[1, 2, 4, 8, 16]));
    assert_eq!(outcome.delays, slept);
    assert_eq!(outcome.result, Err(ServiceError("503 Service Unavailable")));
}

#[test]
fn test_backoff_recovery() {
    let policy = RetryPolicy::default();
    let calls = Cell::new(0u32);
    let mut slept = Vec::new();

    let outcome = retry_with_sleep(
        &policy,
        |d| slept.push(d),
        || {
            calls.set(calls.get() + 1);
            if calls.get() < 3 {
                Err(ServiceError("timeout"))
            } else {
                Ok("issues")
            }
        },
    );

    assert_eq!(outcome.result, Ok("issues"));
    assert_eq!(outcome.attempts, 3);
    assert_eq!(calls.get(), 3);
    assert_eq!(slept, secs(&[1, 2]));
}

#[test]
fn test_delays_capped_at_max() {
    let policy = RetryPolicy::new(Duration::from_secs(10), Duration::from_secs(60), 8);
    let outcome = retry_with_sleep(&policy, |_| {}, || Err::<(), _>(ServiceError("down")));

    assert_eq!(outcome.delays, secs(&[10, 20, 40, 60, 60, 60, 60, 60]));
}

#[test]
fn test_with_retry_keeps_signature() {
    let policy = RetryPolicy::new(Duration::ZERO, Duration::ZERO, 2);
    let mut remaining_failures = 2;

    let mut fetch = with_retry(policy, || {
        if remaining_failures > 0 {
            remaining_failures -= 1;
            Err(ServiceError("flaky"))
        } else {
            Ok(42)
        }
    });

    assert_eq!(fetch(), Ok(42));
    // Later calls start from attempt zero again
    assert_eq!(fetch(), Ok(42));
}

#[test]
fn test_retry_from_config() {
    let config: Config = toml::from_str(
        r#"
        [retry]
        base_delay_secs = 0.0
        max_delay_secs = 0.0
        max_retries = 1
        "#,
    )
    .unwrap();

    let outcome = retry(&config.retry.policy(), || Err::<(), _>(ServiceError("down")));
    assert_eq!(outcome.attempts, 2);
    assert!(outcome.was_retried());
    assert!(!outcome.is_ok());
}
