// ABOUTME: Lifecycle controller: connect, wait for ready, then run one-time
// ABOUTME: initialization (registration, rotator, stats push, diagnostic snapshot).

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::task::JoinHandle;
use tokio::time::{timeout_at, Instant};
use tokio_util::sync::CancellationToken;

use crate::builtin;
use crate::commands::CommandRegistry;
use crate::config::Config;
use crate::console;
use crate::dispatcher::Dispatcher;
use crate::events::{GatewayEvent, ReadyInfo};
use crate::gateway::Gateway;
use crate::presence::{self, PresenceCycle};
use crate::session::{ConnectionState, Session};
use crate::stats::StatsSink;
use crate::telemetry::TelemetryProbe;

/// Drives the session from startup through ready and keeps consuming gateway
/// events until the stream closes or shutdown is requested.
pub struct LifecycleController {
    session: Session,
    gateway: Arc<dyn Gateway>,
    config: Arc<Config>,
    dispatcher: Arc<Dispatcher>,
    probe: TelemetryProbe,
    stats: Option<Arc<dyn StatsSink>>,
    cancel: CancellationToken,
    rotator: Option<JoinHandle<()>>,
}

impl LifecycleController {
    pub fn new(
        session: Session,
        gateway: Arc<dyn Gateway>,
        config: Arc<Config>,
        dispatcher: Arc<Dispatcher>,
        probe: TelemetryProbe,
        stats: Option<Arc<dyn StatsSink>>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            session,
            gateway,
            config,
            dispatcher,
            probe,
            stats,
            cancel,
            rotator: None,
        }
    }

    /// Run the connection to completion.
    ///
    /// Fails fast before any connect attempt when the token is missing. After
    /// that, only ready-phase failures terminate the process; per-invocation
    /// faults stay inside their dispatch tasks.
    pub async fn run(mut self) -> Result<()> {
        if self.session.token().trim().is_empty() {
            anyhow::bail!("bot token is not set; provide CHIRP_TOKEN or [bot] token in config.toml");
        }
        let token = self.session.token().to_string();
        let cancel = self.cancel.clone();

        self.session.set_state(ConnectionState::Connecting);
        let mut events = self
            .gateway
            .connect(&token)
            .await
            .context("failed to establish gateway connection")?;
        self.session.set_state(ConnectionState::Connected);

        // Connected but not ready: nothing dispatches until initialization
        // has finished, and the wait for ready is bounded.
        let ready_deadline = Instant::now() + self.config.ready_timeout();
        while self.session.state() != ConnectionState::Ready {
            tokio::select! {
                _ = cancel.cancelled() => return Ok(()),
                received = timeout_at(ready_deadline, events.recv()) => match received {
                    Err(_) => anyhow::bail!(
                        "gateway ready signal not received within {}s",
                        self.config.bot.ready_timeout_secs
                    ),
                    Ok(None) => anyhow::bail!("gateway event stream closed before ready"),
                    Ok(Some(event)) => self.handle_event(event).await?,
                }
            }
        }

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                received = events.recv() => match received {
                    None => {
                        tracing::warn!("Gateway event stream closed");
                        self.session.set_state(ConnectionState::Disconnected);
                        break;
                    }
                    Some(event) => self.handle_event(event).await?,
                }
            }
        }

        if let Some(rotator) = self.rotator.take() {
            rotator.abort();
        }
        Ok(())
    }

    async fn handle_event(&mut self, event: GatewayEvent) -> Result<()> {
        match event {
            GatewayEvent::Ready(info) => {
                if self.session.state() == ConnectionState::Ready {
                    tracing::debug!("Ready received again after resume, initialization already done");
                    return Ok(());
                }
                self.ready_init(&info).await
            }
            GatewayEvent::Invocation(invocation) => {
                Arc::clone(&self.dispatcher).dispatch(invocation);
                Ok(())
            }
            GatewayEvent::Log(log) => {
                console::print_gateway_log(&log);
                Ok(())
            }
        }
    }

    /// One-time ready initialization, in strict order: command registration,
    /// rotator start, stats push, diagnostic snapshot. Registration failures
    /// are fatal; the stats push and the snapshot are best effort.
    async fn ready_init(&mut self, info: &ReadyInfo) -> Result<()> {
        tracing::info!(
            bot = %info.bot_name,
            guilds = info.guild_count,
            "Gateway ready, running one-time initialization"
        );

        // (a) Command registration. Serving without commands is useless, so
        // failure here rejects startup.
        let registry = Arc::new(CommandRegistry::build(
            builtin::builtin_handlers(),
            self.config.commands.registration,
        )?);
        let count = self
            .gateway
            .register_commands(&registry.definitions())
            .await
            .context("global command registration failed")?;
        self.dispatcher.install_registry(registry)?;
        tracing::info!(commands = count, "Registered global commands");

        // (b) Presence rotation starts only after the command set is live.
        let cycle = PresenceCycle::new(self.config.presence.statuses.clone())?;
        self.rotator = Some(presence::spawn_rotator(
            Arc::clone(&self.gateway),
            cycle,
            self.config.presence.initial_delay(),
            self.config.presence.interval(),
            self.cancel.child_token(),
        ));

        let guilds = self.gateway.guilds().await;
        self.session.set_guilds(guilds);

        // (c) Stats push, skipped under the test identity so shared public
        // metrics are not polluted.
        if self.config.is_test_identity() {
            tracing::info!("Stats not updated because the test identity is in use");
        } else if let Some(stats) = &self.stats {
            match stats.post_server_count(self.session.guild_count()).await {
                Ok(()) => tracing::info!(servers = self.session.guild_count(), "Stats updated"),
                Err(e) => tracing::warn!(error = %e, "Stats update failed"),
            }
        } else {
            tracing::debug!("No stats endpoint configured");
        }

        // (d) Diagnostic snapshot.
        match self.probe.sample().await {
            Ok(sample) => console::print_ready_snapshot(self.session.guilds(), &sample),
            Err(e) => tracing::warn!(error = %e, "Resource snapshot unavailable"),
        }

        self.session.set_state(ConnectionState::Ready);
        Ok(())
    }
}
