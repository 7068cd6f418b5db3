// ABOUTME: Process-wide session handle holding the token, connection state, and guild snapshot.
// ABOUTME: Exactly one Session exists per process; it is owned by the lifecycle controller.

use std::fmt;

use crate::events::GuildInfo;

/// Connection state of the session, advanced by lifecycle events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Ready,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::Ready => "ready",
        };
        write!(f, "{}", label)
    }
}

/// The single connection handle for this process.
pub struct Session {
    token: String,
    state: ConnectionState,
    guilds: Vec<GuildInfo>,
}

impl Session {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            state: ConnectionState::Disconnected,
            guilds: Vec::new(),
        }
    }

    /// The authentication token. Immutable after load.
    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn set_state(&mut self, next: ConnectionState) {
        tracing::debug!(from = %self.state, to = %next, "Session state change");
        self.state = next;
    }

    /// Read-only guild snapshot, refreshed from the transport.
    pub fn guilds(&self) -> &[GuildInfo] {
        &self.guilds
    }

    pub fn set_guilds(&mut self, guilds: Vec<GuildInfo>) {
        self.guilds = guilds;
    }

    pub fn guild_count(&self) -> usize {
        self.guilds.len()
    }

    pub fn total_members(&self) -> u64 {
        self.guilds.iter().map(|g| g.member_count).sum()
    }
}

// Custom Debug impl to redact the token
impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("token", &"[REDACTED]")
            .field("state", &self.state)
            .field("guilds", &self.guilds.len())
            .finish()
    }
}
