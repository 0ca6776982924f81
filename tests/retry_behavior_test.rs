use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use retrier::{FailureKind, QualifyingFailures, Retrier, RetryPolicy};
use tokio::time::Instant;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Failure {
    Timeout { attempt: u32 },
    Value { attempt: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Kind {
    Timeout,
    Value,
}

impl FailureKind for Failure {
    type Kind = Kind;

    fn kind(&self) -> Kind {
        match self {
            Failure::Timeout { .. } => Kind::Timeout,
            Failure::Value { .. } => Kind::Value,
        }
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Failure::Timeout { attempt } => write!(f, "timeout on attempt {attempt}"),
            Failure::Value { attempt } => write!(f, "invalid value on attempt {attempt}"),
        }
    }
}

/// Fails with a timeout until `succeed_on` (1-based), then returns the attempt number.
async fn run(
    retrier: &Retrier<Failure>,
    succeed_on: Option<u32>,
) -> (Result<u32, Failure>, u32, Duration) {
    let attempts = Arc::new(AtomicU32::new(0));
    let counter = attempts.clone();
    let start = Instant::now();

    let result = retrier
        .execute(|| {
            let counter = counter.clone();
            async move {
                let attempt = counter.fetch_add(1, Ordering::SeqCst) + 1;
                match succeed_on {
                    Some(k) if attempt >= k => Ok(attempt),
                    _ => Err(Failure::Timeout { attempt }),
                }
            }
        })
        .await;

    (result, attempts.load(Ordering::SeqCst), start.elapsed())
}

fn build_retrier(max_retries: u32, backoff_factor: f64) -> Retrier<Failure> {
    Retrier::new(
        RetryPolicy::new()
            .with_max_retries(max_retries)
            .with_backoff_factor(backoff_factor),
    )
    .expect("valid policy")
}

fn assert_elapsed(elapsed: Duration, expected: Duration) {
    assert!(
        elapsed >= expected && elapsed < expected + Duration::from_millis(50),
        "elapsed {elapsed:?}, expected about {expected:?}"
    );
}

#[tokio::test(start_paused = true)]
async fn always_failing_operation_runs_exactly_max_retries_times() {
    for n in 1..=6 {
        let (result, attempts, _) = run(&build_retrier(n, 2.0), None).await;

        assert_eq!(attempts, n);
        assert_eq!(result, Err(Failure::Timeout { attempt: n }));
    }
}

#[tokio::test(start_paused = true)]
async fn succeeding_operation_stops_at_first_success() {
    for n in 1..=5 {
        for k in 1..=n {
            let (result, attempts, _) = run(&build_retrier(n, 2.0), Some(k)).await;

            assert_eq!(result, Ok(k));
            assert_eq!(attempts, k);
        }
    }
}

#[tokio::test(start_paused = true)]
async fn three_attempts_wait_one_then_two_units() {
    let (result, attempts, elapsed) = run(&build_retrier(3, 2.0), None).await;

    assert!(result.is_err());
    assert_eq!(attempts, 3);
    assert_elapsed(elapsed, Duration::from_secs(3));
}

#[tokio::test(start_paused = true)]
async fn fails_twice_then_returns_42() {
    let calls = Arc::new(AtomicU32::new(0));
    let counter = calls.clone();

    let result = build_retrier(3, 2.0)
        .execute(|| {
            let counter = counter.clone();
            async move {
                let attempt = counter.fetch_add(1, Ordering::SeqCst) + 1;
                if attempt < 3 {
                    Err(Failure::Timeout { attempt })
                } else {
                    Ok(42)
                }
            }
        })
        .await;

    assert_eq!(result, Ok(42));
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn single_attempt_never_sleeps() {
    let (result, attempts, elapsed) = run(&build_retrier(1, 2.0), None).await;

    assert_eq!(result, Err(Failure::Timeout { attempt: 1 }));
    assert_eq!(attempts, 1);
    assert_eq!(elapsed, Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn first_delay_is_one_unit_regardless_of_factor() {
    let (_, attempts, elapsed) = run(&build_retrier(2, 7.5), None).await;

    assert_eq!(attempts, 2);
    assert_elapsed(elapsed, Duration::from_secs(1));
}

#[tokio::test(start_paused = true)]
async fn non_qualifying_failure_skips_retry_and_delay() {
    let calls = Arc::new(AtomicU32::new(0));
    let counter = calls.clone();
    let start = Instant::now();

    let result: Result<(), Failure> = build_retrier(2, 2.0)
        .with_qualifying(QualifyingFailures::only([Kind::Timeout]))
        .execute(|| {
            let counter = counter.clone();
            async move {
                let attempt = counter.fetch_add(1, Ordering::SeqCst) + 1;
                Err(Failure::Value { attempt })
            }
        })
        .await;

    assert_eq!(result, Err(Failure::Value { attempt: 1 }));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(start.elapsed(), Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn non_qualifying_failure_after_retries_is_returned_as_is() {
    let calls = Arc::new(AtomicU32::new(0));
    let counter = calls.clone();

    let result: Result<(), Failure> = build_retrier(5, 2.0)
        .with_qualifying(QualifyingFailures::only([Kind::Timeout]))
        .execute(|| {
            let counter = counter.clone();
            async move {
                let attempt = counter.fetch_add(1, Ordering::SeqCst) + 1;
                if attempt < 3 {
                    Err(Failure::Timeout { attempt })
                } else {
                    Err(Failure::Value { attempt })
                }
            }
        })
        .await;

    assert_eq!(result, Err(Failure::Value { attempt: 3 }));
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn delay_precedes_next_attempt() {
    let stamps = Arc::new(std::sync::Mutex::new(Vec::new()));
    let recorder = stamps.clone();
    let start = Instant::now();

    let _: Result<(), Failure> = build_retrier(4, 2.0)
        .execute(|| {
            let recorder = recorder.clone();
            async move {
                let mut stamps = recorder.lock().unwrap();
                stamps.push(start.elapsed());
                let attempt = stamps.len() as u32;
                Err(Failure::Timeout { attempt })
            }
        })
        .await;

    let stamps = stamps.lock().unwrap();
    assert_eq!(stamps.len(), 4);
    let expected_gaps = [1, 2, 4];
    for (pair, expected) in stamps.windows(2).zip(expected_gaps) {
        assert_elapsed(pair[1] - pair[0], Duration::from_secs(expected));
    }
}

#[tokio::test(start_paused = true)]
async fn dropping_the_future_cancels_remaining_attempts() {
    let calls = Arc::new(AtomicU32::new(0));
    let counter = calls.clone();
    let retrier = build_retrier(5, 2.0);

    let outcome = tokio::time::timeout(
        Duration::from_millis(1500),
        retrier.execute(|| {
            let counter = counter.clone();
            async move {
                let attempt = counter.fetch_add(1, Ordering::SeqCst) + 1;
                Err::<(), _>(Failure::Timeout { attempt })
            }
        }),
    )
    .await;

    assert!(outcome.is_err(), "timeout should fire during the backoff");
    // Attempt 1 at t=0, attempt 2 at t=1s, then cancelled while waiting 2s.
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn free_function_uses_permissive_default() {
    let calls = Arc::new(AtomicU32::new(0));
    let counter = calls.clone();

    let result: Result<(), Failure> = retrier::retry(|| {
        let counter = counter.clone();
        async move {
            let attempt = counter.fetch_add(1, Ordering::SeqCst) + 1;
            Err(Failure::Value { attempt })
        }
    })
    .await;

    assert_eq!(result, Err(Failure::Value { attempt: 3 }));
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[test]
fn invalid_policies_are_rejected_up_front() {
    assert!(Retrier::<Failure>::new(RetryPolicy::new().with_max_retries(0)).is_err());
    assert!(Retrier::<Failure>::new(RetryPolicy::new().with_backoff_factor(0.0)).is_err());
    assert!(Retrier::<Failure>::new(RetryPolicy::new().with_backoff_factor(-2.0)).is_err());
}
