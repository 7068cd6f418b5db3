// ABOUTME: Main entry point: logging, config, gateway wiring, and interactive shutdown
// ABOUTME: Runs the lifecycle controller until the exit key is pressed or the stream ends

use std::sync::Arc;

use anyhow::Result;
use chirp::config::Config;
use chirp::discord::DiscordGateway;
use chirp::dispatcher::Dispatcher;
use chirp::gateway::Gateway;
use chirp::lifecycle::LifecycleController;
use chirp::session::Session;
use chirp::stats::{HttpStatsSink, StatsSink};
use chirp::telemetry::TelemetryProbe;
use crossterm::event::{Event, KeyCode, KeyEventKind};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Set up panic hook to log panics before they crash the process
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("\nchirp crashed with a panic:\n");
        eprintln!("{}", panic_info);
        eprintln!("\nBacktrace:");
        eprintln!("{:?}", std::backtrace::Backtrace::force_capture());
    }));

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting chirp");

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Arc::new(Config::load()?);

    tracing::info!(
        statuses = config.presence.statuses.len(),
        stats_endpoint = config.stats.url.is_some(),
        registration = ?config.commands.registration,
        "Configuration loaded"
    );

    let gateway: Arc<dyn Gateway> = Arc::new(DiscordGateway::new());
    let session = Session::new(config.bot.token.clone());
    let probe = TelemetryProbe::new()?;
    let dispatcher = Arc::new(Dispatcher::new(Arc::clone(&gateway), probe.clone()));
    let stats: Option<Arc<dyn StatsSink>> = HttpStatsSink::from_config(&config.stats)
        .map(|sink| Arc::new(sink) as Arc<dyn StatsSink>);
    let cancel = CancellationToken::new();

    let controller = LifecycleController::new(
        session,
        Arc::clone(&gateway),
        Arc::clone(&config),
        dispatcher,
        probe,
        stats,
        cancel.clone(),
    );
    let mut runner = tokio::spawn(controller.run());

    // Block on single key presses; `q` shuts the process down.
    tokio::select! {
        finished = &mut runner => {
            cancel.cancel();
            return finished?;
        }
        _ = wait_for_exit_key() => {
            tracing::info!("Exit requested, shutting down");
            cancel.cancel();
        }
    }

    runner.await??;
    tracing::info!("Goodbye");
    Ok(())
}

/// Wait until `q` is pressed on the terminal.
///
/// Falls back to Ctrl-C when no interactive terminal is available.
async fn wait_for_exit_key() {
    let key_wait = tokio::task::spawn_blocking(|| -> Result<()> {
        crossterm::terminal::enable_raw_mode()?;
        let outcome = loop {
            match crossterm::event::read() {
                Ok(Event::Key(key))
                    if key.kind == KeyEventKind::Press
                        && matches!(key.code, KeyCode::Char('q') | KeyCode::Char('Q')) =>
                {
                    break Ok(())
                }
                Ok(_) => continue,
                Err(e) => break Err(e.into()),
            }
        };
        let _ = crossterm::terminal::disable_raw_mode();
        outcome
    })
    .await;

    match key_wait {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "No interactive terminal, waiting for Ctrl-C instead");
            let _ = tokio::signal::ctrl_c().await;
        }
        Err(e) => {
            tracing::warn!(error = %e, "Key listener failed, waiting for Ctrl-C instead");
            let _ = tokio::signal::ctrl_c().await;
        }
    }
}
