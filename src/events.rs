// ABOUTME: Typed events delivered by the gateway transport over the inbound channel.
// ABOUTME: Defines GatewayEvent (ready, invocation, log) and supporting data types.

/// An event entering the dispatch loop from the gateway transport.
#[derive(Debug, Clone)]
pub enum GatewayEvent {
    /// The connection is fully established and one-time initialization may run
    Ready(ReadyInfo),
    /// A slash command invocation from a caller
    Invocation(InvocationEvent),
    /// A diagnostic line emitted by the transport layer
    Log(LogEvent),
}

/// Snapshot carried by the ready-signal.
#[derive(Debug, Clone)]
pub struct ReadyInfo {
    /// Display name of the connected account
    pub bot_name: String,
    /// Number of guilds known at connect time
    pub guild_count: usize,
}

/// A guild the connected account is a member of.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuildInfo {
    /// Platform identifier for the guild
    pub id: String,
    /// Human-readable guild name
    pub name: String,
    /// Member count as reported by the platform
    pub member_count: u64,
}

/// One inbound command invocation. Consumed exactly once by the dispatcher.
#[derive(Debug, Clone)]
pub struct InvocationEvent {
    /// Platform-specific interaction ID
    pub id: String,
    /// Interaction token used to address follow-ups at the original reply
    pub token: String,
    /// Invoked command name (without the leading slash)
    pub command: String,
    /// Display name of the caller
    pub caller: String,
    /// Guild the invocation came from, if not a direct message
    pub guild_id: Option<String>,
    /// Display name of that guild, when the transport can resolve it
    pub guild_name: Option<String>,
    /// Named arguments supplied by the caller
    pub args: Vec<CommandArg>,
}

impl InvocationEvent {
    /// Human-readable origin for telemetry lines
    pub fn location(&self) -> String {
        match &self.guild_name {
            Some(name) => name.clone(),
            None => "a DM".to_string(),
        }
    }

    /// Look up an argument value by name
    pub fn arg(&self, name: &str) -> Option<&str> {
        self.args
            .iter()
            .find(|arg| arg.name == name)
            .map(|arg| arg.value.as_str())
    }
}

/// A named argument attached to an invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandArg {
    pub name: String,
    pub value: String,
}

impl CommandArg {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Diagnostic line from the transport layer.
#[derive(Debug, Clone)]
pub struct LogEvent {
    pub severity: Severity,
    /// Component that produced the line (e.g. "gateway", "shard")
    pub source: String,
    pub message: String,
}

impl LogEvent {
    pub fn new(severity: Severity, source: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity,
            source: source.into(),
            message: message.into(),
        }
    }
}

/// Severity attached to transport diagnostics.
///
/// `Unspecified` exists for transports that cannot classify a line; it gets
/// the catch-all display treatment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Critical,
    Error,
    Warning,
    Info,
    Verbose,
    Debug,
    Unspecified,
}
