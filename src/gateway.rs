// ABOUTME: Gateway trait abstracting the real-time transport behind typed events.
// ABOUTME: Implemented by the serenity adapter in production and by mocks in tests.

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::commands::CommandDef;
use crate::events::{GatewayEvent, GuildInfo, InvocationEvent};

/// Inbound channel of parsed gateway events.
pub type EventReceiver = mpsc::Receiver<GatewayEvent>;

/// The transport collaborator. Owns the wire protocol (connect, heartbeat,
/// resume) and delivers parsed lifecycle and invocation events; everything the
/// dispatch core sends back out goes through here as well.
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Authenticate and start the connection, returning the event stream.
    ///
    /// The stream closing means the connection is gone for good; reconnects
    /// and resumes inside one session are the transport's business.
    async fn connect(&self, token: &str) -> Result<EventReceiver>;

    /// Register the command set globally with the platform.
    /// Returns how many commands the platform accepted.
    async fn register_commands(&self, defs: &[CommandDef]) -> Result<usize>;

    /// Publish an activity/presence string for the connected account.
    async fn set_presence(&self, status: &str) -> Result<()>;

    /// Current guild membership snapshot.
    async fn guilds(&self) -> Vec<GuildInfo>;

    /// Append a reply to the original interaction, never a new top-level message.
    async fn followup(&self, event: &InvocationEvent, text: &str) -> Result<()>;

    /// Fetch the original response to an invocation and delete it.
    async fn delete_original_response(&self, event: &InvocationEvent) -> Result<()>;
}
