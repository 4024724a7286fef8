//! Integration tests for bulk notification
//!
//! Run with: cargo test --test broadcast_test

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use mediagrab::core::broadcast::{notify_all, BroadcastControl, BroadcastOptions, Notifier, NotifyError};
use tokio_util::sync::CancellationToken;

/// Records every delivery and fails or stalls for chosen ids.
#[derive(Default)]
struct FakeNotifier {
    failing: HashSet<i64>,
    stalling: HashSet<i64>,
    delivered: Mutex<Vec<i64>>,
}

impl FakeNotifier {
    fn failing(ids: &[i64]) -> Self {
        Self {
            failing: ids.iter().copied().collect(),
            ..Default::default()
        }
    }

    fn stalling(ids: &[i64]) -> Self {
        Self {
            stalling: ids.iter().copied().collect(),
            ..Default::default()
        }
    }

    fn delivered(&self) -> Vec<i64> {
        self.delivered.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for FakeNotifier {
    async fn send(&self, user_id: i64, _text: &str) -> Result<(), NotifyError> {
        if self.stalling.contains(&user_id) {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        if self.failing.contains(&user_id) {
            return Err(NotifyError::Send("Forbidden: bot was blocked by the user".to_string()));
        }
        self.delivered.lock().unwrap().push(user_id);
        Ok(())
    }
}

fn fast_options() -> BroadcastOptions {
    BroadcastOptions {
        delay: Duration::from_millis(1),
        send_timeout: Duration::from_millis(200),
    }
}

#[tokio::test]
async fn partial_failure_is_counted_and_batch_continues() {
    let notifier = FakeNotifier::failing(&[2]);

    let report = notify_all(&[1, 2, 3], "hello", &notifier, &fast_options(), &CancellationToken::new()).await;

    assert_eq!(report.sent, 2);
    assert_eq!(report.failed, 1);
    assert!(!report.cancelled);
    assert_eq!(notifier.delivered(), vec![1, 3]);
}

#[tokio::test]
async fn empty_id_list_sends_nothing() {
    let notifier = FakeNotifier::default();
    let report = notify_all(&[], "hello", &notifier, &fast_options(), &CancellationToken::new()).await;

    assert_eq!(report.attempted(), 0);
    assert!(!report.cancelled);
}

#[tokio::test]
async fn slow_send_times_out_as_failure() {
    let notifier = FakeNotifier::stalling(&[2]);

    let report = notify_all(&[1, 2, 3], "hello", &notifier, &fast_options(), &CancellationToken::new()).await;

    assert_eq!(report.sent, 2);
    assert_eq!(report.failed, 1);
    assert_eq!(notifier.delivered(), vec![1, 3]);
}

#[tokio::test]
async fn cancelled_before_start_attempts_nothing() {
    let notifier = FakeNotifier::default();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let report = notify_all(&[1, 2, 3], "hello", &notifier, &fast_options(), &cancel).await;

    assert!(report.cancelled);
    assert_eq!(report.attempted(), 0);
    assert!(notifier.delivered().is_empty());
}

#[tokio::test]
async fn cancellation_during_send_counts_only_completed_attempts() {
    let notifier = Arc::new(FakeNotifier::stalling(&[3]));
    let options = BroadcastOptions {
        delay: Duration::from_millis(1),
        send_timeout: Duration::from_secs(3600),
    };
    let cancel = CancellationToken::new();

    let task = {
        let notifier = Arc::clone(&notifier);
        let cancel = cancel.clone();
        tokio::spawn(async move { notify_all(&[1, 2, 3, 4], "hello", notifier.as_ref(), &options, &cancel).await })
    };

    // Wait until the first two went out and the third one is stuck.
    while notifier.delivered().len() < 2 {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    tokio::time::sleep(Duration::from_millis(20)).await;
    cancel.cancel();

    let report = task.await.unwrap();
    assert!(report.cancelled);
    assert_eq!(report.sent, 2);
    assert_eq!(report.failed, 0);
    assert_eq!(notifier.delivered(), vec![1, 2]);
}

#[tokio::test]
async fn cancellation_during_pacing_stops_batch() {
    let notifier = Arc::new(FakeNotifier::default());
    let options = BroadcastOptions {
        delay: Duration::from_secs(3600),
        send_timeout: Duration::from_secs(1),
    };
    let cancel = CancellationToken::new();

    let task = {
        let notifier = Arc::clone(&notifier);
        let cancel = cancel.clone();
        tokio::spawn(async move { notify_all(&[1, 2, 3], "hello", notifier.as_ref(), &options, &cancel).await })
    };

    while notifier.delivered().is_empty() {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    cancel.cancel();

    let report = task.await.unwrap();
    assert!(report.cancelled);
    assert_eq!(report.sent, 1);
    assert_eq!(notifier.delivered(), vec![1]);
}

#[tokio::test]
async fn control_cancels_running_broadcast() {
    let control = Arc::new(BroadcastControl::new());
    let ticket = control.try_begin().unwrap();
    let notifier = Arc::new(FakeNotifier::stalling(&[1]));
    let options = BroadcastOptions {
        delay: Duration::from_millis(1),
        send_timeout: Duration::from_secs(3600),
    };

    let task = {
        let notifier = Arc::clone(&notifier);
        tokio::spawn(async move {
            let report = notify_all(&[1, 2], "hello", notifier.as_ref(), &options, ticket.token()).await;
            drop(ticket);
            report
        })
    };

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(control.is_running());
    assert!(control.cancel());

    let report = task.await.unwrap();
    assert!(report.cancelled);
    assert_eq!(report.attempted(), 0);
    assert!(!control.is_running());
}
