//! Behavioral properties of the retry executor, driven on a paused clock.

mod common;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use common::{quick_policy, FlakyOperation, InjectedError};
use gas_price_api::db::{ConnectionState, SharedConnectionState};
use gas_price_api::resilience::{
    classify, execute_with_readiness_and_retry, execute_with_retry, AttemptOutcome, Classify,
    ExecutorError, FailureKind, RetryExecutor, RetryOptions,
};

const TERMINAL_KINDS: [FailureKind; 5] = [
    FailureKind::Validation,
    FailureKind::Cast,
    FailureKind::Auth,
    FailureKind::NotFound,
    FailureKind::DuplicateKey,
];

const RETRYABLE_KINDS: [FailureKind; 2] = [FailureKind::Timeout, FailureKind::Unclassified];

#[tokio::test(start_paused = true)]
async fn retryable_failure_invokes_operation_max_retries_plus_one_times() {
    for retries in 0..=5u32 {
        for kind in RETRYABLE_KINDS {
            let op = FlakyOperation::always(kind);
            let executor = RetryExecutor::new(quick_policy(retries));

            let result = executor.execute(|| op.invoke()).await;

            assert_eq!(op.calls(), retries + 1, "retries={} kind={}", retries, kind);
            match result {
                Err(ExecutorError::RetriesExhausted { kind: k, attempts, source }) => {
                    assert_eq!(k, kind);
                    assert_eq!(attempts, retries + 1);
                    assert_eq!(source, InjectedError(kind));
                }
                other => panic!("expected RetriesExhausted, got {:?}", other.map(|_| ())),
            }
        }
    }
}

#[tokio::test(start_paused = true)]
async fn terminal_failure_invokes_operation_exactly_once() {
    for retries in [0u32, 1, 3, 10] {
        for kind in TERMINAL_KINDS {
            let op = FlakyOperation::always(kind);
            let executor = RetryExecutor::new(quick_policy(retries));

            let result = executor.execute(|| op.invoke()).await;

            assert_eq!(op.calls(), 1, "retries={} kind={}", retries, kind);
            match result {
                Err(ExecutorError::Terminal { kind: k, source }) => {
                    assert_eq!(k, kind);
                    assert_eq!(source, InjectedError(kind));
                }
                other => panic!("expected Terminal, got {:?}", other.map(|_| ())),
            }
        }
    }
}

#[tokio::test(start_paused = true)]
async fn success_on_third_call_returns_value_after_three_invocations() {
    let op = FlakyOperation::new(2, FailureKind::Unclassified);
    let outcomes = Arc::new(Mutex::new(Vec::<AttemptOutcome>::new()));
    let sink = outcomes.clone();

    let executor = RetryExecutor::new(quick_policy(3))
        .with_observer(move |outcome| sink.lock().unwrap().push(*outcome));

    let value = executor.execute(|| op.invoke()).await.unwrap();

    assert_eq!(value, 3);
    assert_eq!(op.calls(), 3);

    let outcomes = outcomes.lock().unwrap();
    assert_eq!(outcomes.len(), 3);
    assert!(outcomes[..2].iter().all(|o| !o.succeeded && o.delay.is_some()));
    assert!(outcomes[2].succeeded);
    assert_eq!(outcomes[2].delay, None);
}

#[tokio::test(start_paused = true)]
async fn never_resolving_operation_surfaces_operation_timeout() {
    let calls = Arc::new(Mutex::new(0u32));
    let counter = calls.clone();
    let executor = RetryExecutor::new(quick_policy(2));

    let result: Result<(), ExecutorError<InjectedError>> = executor
        .execute(|| {
            *counter.lock().unwrap() += 1;
            std::future::pending()
        })
        .await;

    assert_eq!(*calls.lock().unwrap(), 3);
    match result {
        Err(ExecutorError::OperationTimeout { attempts, timeout }) => {
            assert_eq!(attempts, 3);
            assert_eq!(timeout, Duration::from_millis(500));
        }
        other => panic!("expected OperationTimeout, got {:?}", other.map(|_| ())),
    }
}

#[tokio::test(start_paused = true)]
async fn slow_first_attempt_is_retried_then_succeeds() {
    let calls = Arc::new(Mutex::new(0u32));
    let counter = calls.clone();
    let executor = RetryExecutor::new(quick_policy(3));

    let result: Result<&str, ExecutorError<InjectedError>> = executor
        .execute(|| {
            let call = {
                let mut guard = counter.lock().unwrap();
                *guard += 1;
                *guard
            };
            async move {
                if call == 1 {
                    tokio::time::sleep(Duration::from_secs(60)).await;
                }
                Ok("done")
            }
        })
        .await;

    assert_eq!(result.unwrap(), "done");
    assert_eq!(*calls.lock().unwrap(), 2);
}

#[tokio::test(start_paused = true)]
async fn every_scheduled_delay_respects_max_delay() {
    let delays = Arc::new(Mutex::new(Vec::new()));
    let sink = delays.clone();
    let op = FlakyOperation::always(FailureKind::Timeout);

    let executor = RetryExecutor::new(quick_policy(12)).with_observer(move |outcome| {
        if let Some(delay) = outcome.delay {
            sink.lock().unwrap().push(delay);
        }
    });

    let _ = executor.execute(|| op.invoke()).await;

    let delays = delays.lock().unwrap();
    assert_eq!(delays.len(), 12);
    assert!(delays.iter().all(|d| *d <= Duration::from_secs(2)));
    // The exponential term alone passes the cap by the fifth retry.
    assert_eq!(delays[11], Duration::from_secs(2));
}

#[tokio::test(start_paused = true)]
async fn default_options_allow_four_attempts() {
    let op = FlakyOperation::always(FailureKind::Unclassified);

    let result = execute_with_retry(|| op.invoke(), RetryOptions::default()).await;

    assert!(matches!(result, Err(ExecutorError::RetriesExhausted { attempts: 4, .. })));
    assert_eq!(op.calls(), 4);
}

#[tokio::test(start_paused = true)]
async fn negative_max_retries_is_rejected_before_any_attempt() {
    let op = FlakyOperation::new(0, FailureKind::Unclassified);

    let result = execute_with_retry(|| op.invoke(), RetryOptions::default().max_retries(-1)).await;

    assert!(matches!(result, Err(ExecutorError::InvalidPolicy(_))));
    assert_eq!(op.calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn readiness_timeout_never_invokes_operation() {
    let state = SharedConnectionState::new(ConnectionState::Connecting);
    let op = FlakyOperation::new(0, FailureKind::Unclassified);

    let result = execute_with_readiness_and_retry(&state, || op.invoke(), RetryOptions::default()).await;

    assert!(matches!(result, Err(ExecutorError::ReadinessTimeout(_))));
    assert_eq!(op.calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn readiness_then_retry_runs_once_connection_flips() {
    let state = Arc::new(SharedConnectionState::new(ConnectionState::Connecting));
    let flipper = state.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(2)).await;
        flipper.set(ConnectionState::Connected);
    });

    let op = FlakyOperation::new(1, FailureKind::Unclassified);
    let result = execute_with_readiness_and_retry(&state, || op.invoke(), RetryOptions::default()).await;

    assert_eq!(result.unwrap(), 2);
    assert_eq!(op.calls(), 2);
}

#[test]
fn classification_is_deterministic_and_total() {
    for kind in TERMINAL_KINDS {
        let err = InjectedError(kind);
        let first = classify(&err);
        assert_eq!(first, classify(&err));
        assert_eq!(first.kind, kind);
        assert!(!first.retryable);
    }
    for kind in RETRYABLE_KINDS {
        let err = InjectedError(kind);
        assert_eq!(err.failure_kind(), kind);
        assert!(classify(&err).retryable);
    }
}
