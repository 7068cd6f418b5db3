// ABOUTME: Command dispatcher: one independent task per invocation, outcome
// ABOUTME: classification, best-effort response cleanup, and per-invocation telemetry.

use std::sync::{Arc, OnceLock};

use anyhow::Result;
use chrono::Local;
use tokio::task::JoinHandle;

use crate::commands::{CommandRegistry, CommandResult, FailureKind, HandlerStatus};
use crate::console;
use crate::events::InvocationEvent;
use crate::gateway::Gateway;
use crate::reporter;
use crate::telemetry::{ResourceSample, TelemetryProbe};

/// Everything one dispatched invocation produced: the classified result and
/// the telemetry line that was printed for it.
#[derive(Debug)]
pub struct InvocationReport {
    pub result: CommandResult,
    pub line: String,
}

/// Routes invocation events to registered handlers.
///
/// The registry is installed exactly once during ready initialization;
/// overlapping invocations share it read-only and never block each other.
pub struct Dispatcher {
    gateway: Arc<dyn Gateway>,
    probe: TelemetryProbe,
    registry: OnceLock<Arc<CommandRegistry>>,
}

impl Dispatcher {
    pub fn new(gateway: Arc<dyn Gateway>, probe: TelemetryProbe) -> Self {
        Self {
            gateway,
            probe,
            registry: OnceLock::new(),
        }
    }

    /// Install the command set. The set is never re-registered mid-session,
    /// so a second install is an error.
    pub fn install_registry(&self, registry: Arc<CommandRegistry>) -> Result<()> {
        self.registry
            .set(registry)
            .map_err(|_| anyhow::anyhow!("command registry already installed"))
    }

    /// Fire-and-forget dispatch of one invocation on its own task.
    ///
    /// Each task is an independent error boundary; a faulting handler cannot
    /// affect concurrently running invocations or the event loop.
    pub fn dispatch(self: Arc<Self>, event: InvocationEvent) -> JoinHandle<()> {
        let dispatcher = self;
        tokio::spawn(async move {
            let report = dispatcher.process(&event).await;
            console::print_invocation_line(&report.line);
        })
    }

    /// Run one invocation to completion: execute, report the outcome, and
    /// build the telemetry line. The line is produced whether or not the
    /// command failed.
    pub async fn process(&self, event: &InvocationEvent) -> InvocationReport {
        let result = self.execute(event).await;
        tracing::debug!(command = %event.command, result = ?result, "Invocation finished");

        reporter::report(self.gateway.as_ref(), event, &result).await;

        let sample = match self.probe.sample().await {
            Ok(sample) => sample,
            Err(e) => {
                tracing::warn!(error = %e, "Telemetry sample failed");
                ResourceSample::default()
            }
        };
        let line =
            console::format_invocation_line(Local::now(), &sample, &event.location(), &event.command);

        InvocationReport { result, line }
    }

    async fn execute(&self, event: &InvocationEvent) -> CommandResult {
        let Some(registry) = self.registry.get() else {
            tracing::warn!(command = %event.command, "Invocation received before command registration");
            return CommandResult::Failure(FailureKind::UnknownCommand);
        };

        let Some(registered) = registry.get(&event.command) else {
            return CommandResult::Failure(FailureKind::UnknownCommand);
        };

        if let Err(reason) = registered.def.check_preconditions(event) {
            return CommandResult::Failure(FailureKind::UnmetPrecondition { reason });
        }

        if !registered.def.args_valid(event) {
            return CommandResult::Failure(FailureKind::BadArguments);
        }

        match registered
            .handler
            .run(Arc::clone(&self.gateway), event)
            .await
        {
            Ok(HandlerStatus::Completed) => CommandResult::Success,
            Ok(HandlerStatus::NotExecuted) => CommandResult::Failure(FailureKind::Unsuccessful),
            Err(e) => {
                tracing::error!(command = %event.command, error = %e, "Command handler failed");
                self.cleanup_partial_response(event).await;
                CommandResult::Failure(FailureKind::HandlerError {
                    reason: e.to_string(),
                })
            }
        }
    }

    /// Best-effort removal of a partially-visible response after a handler
    /// fault. Its own failure is swallowed; cleanup must never take down the
    /// dispatch path.
    async fn cleanup_partial_response(&self, event: &InvocationEvent) {
        if let Err(e) = self.gateway.delete_original_response(event).await {
            tracing::debug!(
                command = %event.command,
                error = %e,
                "Partial response cleanup skipped"
            );
        }
    }
}
