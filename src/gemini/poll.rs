//! Polling for long-running operations.
//!
//! The poller waits a fixed interval between status checks, stops after a
//! configurable number of checks or wall-clock deadline, and gives up as soon
//! as its cancellation token fires.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::error::GenerationError;
use super::types::Operation;

/// Default wait between status checks (10 seconds).
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Default cap on status checks (15 minutes at the default interval).
pub const DEFAULT_MAX_POLL_ATTEMPTS: u32 = 90;

/// How an operation is polled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollPolicy {
    /// Wait before each status check.
    pub interval: Duration,
    /// Maximum number of status checks, `None` for unbounded.
    pub max_attempts: Option<u32>,
    /// Maximum time spent polling, `None` for unbounded.
    pub deadline: Option<Duration>,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            max_attempts: Some(DEFAULT_MAX_POLL_ATTEMPTS),
            deadline: None,
        }
    }
}

impl PollPolicy {
    /// Same bounds, different interval.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }
}

/// Poll `operation` until it reports `done`.
///
/// Each iteration waits `policy.interval`, then calls `fetch` with the
/// operation name. An operation that is already done is returned without
/// waiting or fetching.
///
/// # Errors
///
/// Returns `GenerationError::Cancelled` if `cancel` fires while waiting,
/// `GenerationError::PollTimeout` once the attempt cap or deadline is reached,
/// or whatever error `fetch` returns.
pub async fn poll_until_done<F, Fut>(
    mut operation: Operation,
    policy: &PollPolicy,
    cancel: &CancellationToken,
    mut fetch: F,
) -> Result<Operation, GenerationError>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<Operation, GenerationError>>,
{
    let started = Instant::now();
    let mut attempts = 0u32;

    while !operation.done {
        let elapsed = started.elapsed();
        let out_of_attempts = policy.max_attempts.is_some_and(|max| attempts >= max);
        let past_deadline = policy.deadline.is_some_and(|deadline| elapsed >= deadline);
        if out_of_attempts || past_deadline {
            log::error!(
                "Operation {} still running after {} status checks ({:?})",
                operation.name,
                attempts,
                elapsed
            );
            return Err(GenerationError::PollTimeout { attempts, elapsed });
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                log::info!(
                    "Polling of {} cancelled after {} status checks",
                    operation.name,
                    attempts
                );
                return Err(GenerationError::Cancelled);
            }
            _ = tokio::time::sleep(policy.interval) => {}
        }

        attempts += 1;
        log::debug!("Checking operation {} (attempt {})", operation.name, attempts);

        let next = fetch(operation.name.clone()).await?;
        operation = if next.name.is_empty() {
            Operation {
                name: operation.name,
                ..next
            }
        } else {
            next
        };
    }

    log::info!("Operation {} completed after {} status checks", operation.name, attempts);
    Ok(operation)
}
