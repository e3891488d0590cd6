//! Progress tracking and operation polling for asynchronous hosting calls
//!
//! Lifecycle calls return an operation which must be polled until the
//! provider reports `DONE`. This module provides that polling with optional
//! progress callbacks for UI updates.
//!
//! The interval is fixed (no backoff). A wait is bounded by
//! [`WaitOptions::timeout`] unless it is set to `None`, and can be cancelled
//! by dropping the future.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, error};

use crate::api::{HostingClient, OperationInfo, OperationStep};
use crate::error::{CoreError, Result};

/// Time between two `operation.info` calls
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Shortest interval accepted; smaller values are raised to it
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Upper bound for a single operation wait
pub const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// Polling parameters for [`wait_for_operation`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitOptions {
    pub interval: Duration,
    /// `None` polls until a terminal status is seen
    pub timeout: Option<Duration>,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            timeout: Some(DEFAULT_WAIT_TIMEOUT),
        }
    }
}

impl WaitOptions {
    /// Set the polling interval, raised to [`MIN_POLL_INTERVAL`] if shorter
    #[must_use]
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval.max(MIN_POLL_INTERVAL);
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Progress events emitted while waiting on an operation
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    /// Wait has begun
    Started { operation_id: i64 },
    /// Polling iteration with current status
    Polling {
        operation_id: i64,
        status: String,
        elapsed: Duration,
    },
    /// Operation reached DONE
    Completed { operation_id: i64 },
    /// Operation failed, timed out or could not be queried
    Failed { operation_id: i64, error: String },
}

/// Callback type for progress updates
///
/// Shared so a driver can reuse one callback across the several waits of a
/// single lifecycle command.
pub type ProgressCallback = Arc<dyn Fn(ProgressEvent) + Send + Sync>;

/// Poll an operation until completion
///
/// # Arguments
///
/// * `client` - The hosting API client
/// * `operation_id` - The operation to poll
/// * `options` - Interval and optional timeout
/// * `on_progress` - Optional callback for progress updates
///
/// # Returns
///
/// The final operation record, or an error if the operation ended in an
/// unexpected status, the status call failed, or the wait timed out.
///
/// # Example
///
/// ```rust,ignore
/// use gandictl_core::{wait_for_operation, WaitOptions};
///
/// let op = client.vm_start(vm_id).await?;
/// wait_for_operation(&client, op.id, WaitOptions::default(), None).await?;
/// ```
pub async fn wait_for_operation(
    client: &HostingClient,
    operation_id: i64,
    options: WaitOptions,
    on_progress: Option<ProgressCallback>,
) -> Result<OperationInfo> {
    emit(&on_progress, ProgressEvent::Started { operation_id });

    let polling = poll_until_terminal(client, operation_id, options.interval, &on_progress);
    // The deadline also covers a status call still in flight
    let result = match options.timeout {
        Some(timeout) => tokio::time::timeout(timeout, polling)
            .await
            .unwrap_or_else(|_| {
                Err(CoreError::OperationTimeout {
                    operation_id,
                    timeout,
                })
            }),
        None => polling.await,
    };

    match &result {
        Ok(_) => emit(&on_progress, ProgressEvent::Completed { operation_id }),
        Err(e) => emit(
            &on_progress,
            ProgressEvent::Failed {
                operation_id,
                error: e.to_string(),
            },
        ),
    }
    result
}

async fn poll_until_terminal(
    client: &HostingClient,
    operation_id: i64,
    interval: Duration,
    on_progress: &Option<ProgressCallback>,
) -> Result<OperationInfo> {
    let start = Instant::now();
    let interval = interval.max(MIN_POLL_INTERVAL);

    loop {
        let op = client.operation_info(operation_id).await.inspect_err(|e| {
            error!("Got operation #{}, err: {}", operation_id, e);
        })?;

        emit(
            on_progress,
            ProgressEvent::Polling {
                operation_id,
                status: op.status.clone(),
                elapsed: start.elapsed(),
            },
        );

        match op.step() {
            OperationStep::Done => return Ok(op),
            step if step.is_in_flight() => {
                debug!("Waiting for operation #{} ({})", operation_id, op.status);
                tokio::time::sleep(interval).await;
            }
            _ => {
                error!("Error waiting for operation: {}", operation_id);
                return Err(CoreError::OperationFailed {
                    operation_id,
                    status: op.status,
                });
            }
        }
    }
}

/// Helper to emit progress events
fn emit(callback: &Option<ProgressCallback>, event: ProgressEvent) {
    if let Some(cb) = callback {
        cb(event);
    }
}
