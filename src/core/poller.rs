//! Status polling for remote operations.
//!
//! The poll loop re-queries the service at a fixed interval until the
//! operation reports a terminal state. Queries are strictly sequential: a
//! new query is never issued before the previous one resolves. The loop is
//! bounded by an optional deadline and a cancellation token, both checked at
//! every suspension point, so it can never spin forever.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::{sleep, sleep_until, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::adapters::VideoBackend;
use crate::domain::Operation;
use crate::error::PollError;

/// Settings for the poll loop
#[derive(Debug, Clone)]
pub struct PollSettings {
    /// Fixed wait between status queries
    pub interval: Duration,

    /// Overall deadline; `None` polls until terminal or cancelled
    pub deadline: Option<Duration>,

    /// Retry policy for transient query failures
    pub retry: RetryPolicy,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            deadline: Some(Duration::from_secs(600)),
            retry: RetryPolicy::default(),
        }
    }
}

/// Backoff for transient status-query failures.
///
/// A query that fails transiently is retried after a doubling delay; once
/// the attempt budget is spent the poll loop surfaces the failure instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Queries that may fail before the loop gives up (including the first)
    pub max_attempts: u32,

    /// Delay before the first retry in milliseconds
    pub initial_delay_ms: u64,

    /// Ceiling on the backoff delay in milliseconds
    pub max_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay_ms: 1000,
            max_delay_ms: 30_000,
        }
    }
}

impl RetryPolicy {
    /// Wait before the next retry after `failures` consecutive failures,
    /// or `None` once the attempt budget is spent.
    pub fn backoff(&self, failures: u32) -> Option<Duration> {
        if failures >= self.max_attempts {
            return None;
        }

        // initial, 2x, 4x, ... up to the ceiling
        let doublings = failures.saturating_sub(1).min(20);
        let delay_ms = self
            .initial_delay_ms
            .saturating_mul(1 << doublings)
            .min(self.max_delay_ms);

        Some(Duration::from_millis(delay_ms))
    }
}

/// Poll an operation to a terminal state.
///
/// Waits one interval, re-queries keyed by the current snapshot, and replaces
/// the snapshot with the fresh one until `done` is set. Returns the terminal
/// snapshot; the caller inspects it for the error/result payload.
pub async fn await_completion(
    backend: &dyn VideoBackend,
    operation: Operation,
    settings: &PollSettings,
    cancel: &CancellationToken,
) -> Result<Operation, PollError> {
    let started = Instant::now();
    let deadline_at = settings.deadline.map(|d| started + d);

    let mut current = operation;
    let mut polls: u32 = 0;

    while !current.done {
        tokio::select! {
            _ = cancel.cancelled() => return Err(PollError::Cancelled),
            _ = wait_for_deadline(deadline_at) => {
                return Err(PollError::TimedOut {
                    elapsed_seconds: started.elapsed().as_secs(),
                });
            }
            _ = sleep(settings.interval) => {}
        }

        current = query_with_retry(backend, &current, settings, cancel, deadline_at, started).await?;
        polls += 1;

        debug!(
            polls,
            elapsed_s = started.elapsed().as_secs(),
            done = current.done,
            metadata = ?current.metadata,
            "Polled generation status"
        );
    }

    Ok(current)
}

/// One sequential status query, retried on transient failures
async fn query_with_retry(
    backend: &dyn VideoBackend,
    current: &Operation,
    settings: &PollSettings,
    cancel: &CancellationToken,
    deadline_at: Option<Instant>,
    started: Instant,
) -> Result<Operation, PollError> {
    let mut failures: u32 = 0;

    loop {
        let result = tokio::select! {
            _ = cancel.cancelled() => return Err(PollError::Cancelled),
            result = backend.query(current) => result,
        };

        let error = match result {
            Ok(next) => return Ok(next),
            Err(e) => e,
        };

        failures += 1;
        let delay = match settings.retry.backoff(failures) {
            Some(delay) if error.is_transient() => delay,
            _ => return Err(PollError::Backend(error)),
        };

        warn!(
            failures,
            delay_ms = delay.as_millis() as u64,
            error = %error,
            "Status query failed, retrying"
        );

        tokio::select! {
            _ = cancel.cancelled() => return Err(PollError::Cancelled),
            _ = wait_for_deadline(deadline_at) => {
                return Err(PollError::TimedOut {
                    elapsed_seconds: started.elapsed().as_secs(),
                });
            }
            _ = sleep(delay) => {}
        }
    }
}

/// Resolves at the deadline; pends forever when no deadline is set
async fn wait_for_deadline(deadline_at: Option<Instant>) {
    match deadline_at {
        Some(at) => sleep_until(at).await,
        None => std::future::pending::<()>().await,
    }
}
