//! Bulk notification driver
//!
//! [`notify_all`] walks a list of user ids that was read from the store up
//! front, so the store lock is never held while waiting on the network.
//! Each send is bounded by a timeout and consecutive sends are paced by an
//! async sleep. Cancellation stops the batch between or during attempts;
//! an attempt interrupted by cancellation is counted neither as sent nor
//! as failed.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::core::config;

/// Failure to deliver one message.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("send failed: {0}")]
    Send(String),

    #[error("send timed out after {0:?}")]
    Timeout(Duration),
}

/// Delivers a text message to one user.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, user_id: i64, text: &str) -> Result<(), NotifyError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BroadcastOptions {
    /// Pause between two consecutive recipients.
    pub delay: Duration,
    /// Upper bound for a single send.
    pub send_timeout: Duration,
}

impl BroadcastOptions {
    pub fn from_config() -> Self {
        Self {
            delay: config::broadcast::delay(),
            send_timeout: config::broadcast::send_timeout(),
        }
    }
}

impl Default for BroadcastOptions {
    fn default() -> Self {
        Self {
            delay: Duration::from_millis(100),
            send_timeout: Duration::from_secs(10),
        }
    }
}

/// Outcome of a batch. `sent + failed` is the number of completed attempts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BroadcastReport {
    pub sent: u64,
    pub failed: u64,
    pub cancelled: bool,
}

impl BroadcastReport {
    pub fn attempted(&self) -> u64 {
        self.sent + self.failed
    }
}

/// Sends `message` to every id in `ids`, continuing past individual failures.
pub async fn notify_all<N>(
    ids: &[i64],
    message: &str,
    notifier: &N,
    options: &BroadcastOptions,
    cancel: &CancellationToken,
) -> BroadcastReport
where
    N: Notifier + ?Sized,
{
    let mut report = BroadcastReport::default();

    for (index, &user_id) in ids.iter().enumerate() {
        if cancel.is_cancelled() {
            report.cancelled = true;
            break;
        }

        if index > 0 && !options.delay.is_zero() {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    report.cancelled = true;
                    break;
                }
                _ = tokio::time::sleep(options.delay) => {}
            }
        }

        let attempt = tokio::time::timeout(options.send_timeout, notifier.send(user_id, message));
        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                report.cancelled = true;
                break;
            }
            result = attempt => result.unwrap_or(Err(NotifyError::Timeout(options.send_timeout))),
        };

        match result {
            Ok(()) => report.sent += 1,
            Err(e) => {
                report.failed += 1;
                log::warn!("Broadcast to user {} failed: {}", user_id, e);
            }
        }
    }

    log::info!(
        "Broadcast finished: {} sent, {} failed, {} of {} attempted{}",
        report.sent,
        report.failed,
        report.attempted(),
        ids.len(),
        if report.cancelled { " (cancelled)" } else { "" }
    );
    report
}

/// Allows one broadcast at a time and lets an admin stop it.
#[derive(Debug, Default)]
pub struct BroadcastControl {
    running: Mutex<Option<CancellationToken>>,
}

impl BroadcastControl {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self) -> MutexGuard<'_, Option<CancellationToken>> {
        self.running.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Claims the broadcast slot. `None` while another broadcast runs.
    pub fn try_begin(self: &Arc<Self>) -> Option<BroadcastTicket> {
        let mut slot = self.slot();
        if slot.is_some() {
            return None;
        }
        let token = CancellationToken::new();
        *slot = Some(token.clone());
        Some(BroadcastTicket {
            control: Arc::clone(self),
            token,
        })
    }

    /// Requests cancellation of the running broadcast, if any.
    pub fn cancel(&self) -> bool {
        match self.slot().as_ref() {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    pub fn is_running(&self) -> bool {
        self.slot().is_some()
    }
}

/// Held by the running broadcast; frees the slot when dropped.
#[derive(Debug)]
pub struct BroadcastTicket {
    control: Arc<BroadcastControl>,
    token: CancellationToken,
}

impl BroadcastTicket {
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}

impl Drop for BroadcastTicket {
    fn drop(&mut self) {
        *self.control.slot() = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_one_ticket_at_a_time() {
        let control = Arc::new(BroadcastControl::new());
        assert!(!control.is_running());
        assert!(!control.cancel());

        let ticket = control.try_begin().unwrap();
        assert!(control.is_running());
        assert!(control.try_begin().is_none());

        assert!(control.cancel());
        assert!(ticket.token().is_cancelled());

        drop(ticket);
        assert!(!control.is_running());
        assert!(control.try_begin().is_some());
    }

    #[test]
    fn report_counts_attempts() {
        let report = BroadcastReport {
            sent: 4,
            failed: 2,
            cancelled: false,
        };
        assert_eq!(report.attempted(), 6);
    }
}
