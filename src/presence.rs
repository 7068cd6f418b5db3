// ABOUTME: Presence rotation: a cyclic status sequence published on a fixed
// ABOUTME: interval by a dedicated background task with explicit cancellation.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant};
use tokio_util::sync::CancellationToken;

use crate::gateway::Gateway;

/// Ordered, cyclic, fixed sequence of status strings plus the current index.
///
/// Mutated only by the rotator task; the index wraps modulo the sequence
/// length and the sequence never changes at runtime.
#[derive(Debug, Clone)]
pub struct PresenceCycle {
    statuses: Vec<String>,
    index: usize,
}

impl PresenceCycle {
    pub fn new(statuses: Vec<String>) -> Result<Self> {
        anyhow::ensure!(
            !statuses.is_empty(),
            "presence cycle needs at least one status"
        );
        Ok(Self { statuses, index: 0 })
    }

    /// Return the current status and step to the next one.
    pub fn advance(&mut self) -> &str {
        let current = self.index;
        self.index = (self.index + 1) % self.statuses.len();
        &self.statuses[current]
    }

    pub fn len(&self) -> usize {
        self.statuses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statuses.is_empty()
    }

    /// Index of the status the next tick will publish.
    pub fn position(&self) -> usize {
        self.index
    }
}

/// Start the background rotator task.
///
/// Publishes the next status every `interval` after an `initial_delay`. A
/// failed update is logged and the loop keeps going; the task stops when the
/// cancellation token fires. Runs independently of command dispatch.
pub fn spawn_rotator(
    gateway: Arc<dyn Gateway>,
    mut cycle: PresenceCycle,
    initial_delay: Duration,
    interval: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        tracing::info!(
            statuses = cycle.len(),
            interval_secs = interval.as_secs(),
            "Starting presence rotator"
        );

        let mut ticker = interval_at(Instant::now() + initial_delay, interval);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::debug!("Presence rotator stopped");
                    break;
                }
                _ = ticker.tick() => {
                    let status = cycle.advance().to_string();
                    if let Err(e) = gateway.set_presence(&status).await {
                        tracing::warn!(error = %e, status = %status, "Failed to update presence");
                    }
                }
            }
        }
    })
}
