// ABOUTME: Shared test doubles: a mock Gateway recording every call in order
// ABOUTME: plus helpers for building synthetic invocation events.

#![allow(dead_code)]

use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;
use chirp::commands::CommandDef;
use chirp::events::{CommandArg, GatewayEvent, GuildInfo, InvocationEvent};
use chirp::gateway::{EventReceiver, Gateway};
use tokio::sync::mpsc;

/// Mock gateway that records operations and hands out a pre-built event
/// channel on connect. Tests feed synthetic events through `feed`.
pub struct MockGateway {
    receiver: Mutex<Option<EventReceiver>>,
    sender: Mutex<Option<mpsc::Sender<GatewayEvent>>>,
    /// Tokens passed to connect, in order
    pub connect_tokens: Mutex<Vec<String>>,
    /// Every operation in call order ("connect", "register_commands",
    /// "set_presence:<status>", "followup", "delete")
    pub ops: Mutex<Vec<String>>,
    /// (command, text) per follow-up
    pub followups: Mutex<Vec<(String, String)>>,
    /// Commands whose original response deletion was attempted
    pub deletes: Mutex<Vec<String>>,
    pub guilds: Vec<GuildInfo>,
    pub fail_delete: bool,
    pub fail_followup: bool,
}

impl MockGateway {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::channel(64);
        Self {
            receiver: Mutex::new(Some(receiver)),
            sender: Mutex::new(Some(sender)),
            connect_tokens: Mutex::new(Vec::new()),
            ops: Mutex::new(Vec::new()),
            followups: Mutex::new(Vec::new()),
            deletes: Mutex::new(Vec::new()),
            guilds: Vec::new(),
            fail_delete: false,
            fail_followup: false,
        }
    }

    /// Feed a synthetic event into the stream handed out by connect.
    pub async fn feed(&self, event: GatewayEvent) {
        let sender = self
            .sender
            .lock()
            .unwrap()
            .clone()
            .expect("event stream already closed");
        sender.send(event).await.expect("event stream receiver gone");
    }

    /// Drop the sending half so the event stream ends.
    pub fn close_stream(&self) {
        self.sender.lock().unwrap().take();
    }

    pub fn with_guilds(mut self, guilds: Vec<GuildInfo>) -> Self {
        self.guilds = guilds;
        self
    }

    pub fn failing_delete(mut self) -> Self {
        self.fail_delete = true;
        self
    }

    pub fn ops_snapshot(&self) -> Vec<String> {
        self.ops.lock().unwrap().clone()
    }

    /// Index of the first operation starting with `prefix`.
    pub fn op_index(&self, prefix: &str) -> Option<usize> {
        self.ops
            .lock()
            .unwrap()
            .iter()
            .position(|op| op.starts_with(prefix))
    }

    pub fn followup_texts(&self) -> Vec<String> {
        self.followups
            .lock()
            .unwrap()
            .iter()
            .map(|(_, text)| text.clone())
            .collect()
    }

    pub fn presence_updates(&self) -> Vec<String> {
        self.ops
            .lock()
            .unwrap()
            .iter()
            .filter_map(|op| op.strip_prefix("set_presence:").map(String::from))
            .collect()
    }
}

#[async_trait]
impl Gateway for MockGateway {
    async fn connect(&self, token: &str) -> Result<EventReceiver> {
        self.connect_tokens.lock().unwrap().push(token.to_string());
        self.ops.lock().unwrap().push("connect".to_string());
        self.receiver
            .lock()
            .unwrap()
            .take()
            .ok_or_else(|| anyhow::anyhow!("already connected"))
    }

    async fn register_commands(&self, defs: &[CommandDef]) -> Result<usize> {
        self.ops.lock().unwrap().push("register_commands".to_string());
        Ok(defs.len())
    }

    async fn set_presence(&self, status: &str) -> Result<()> {
        self.ops
            .lock()
            .unwrap()
            .push(format!("set_presence:{}", status));
        Ok(())
    }

    async fn guilds(&self) -> Vec<GuildInfo> {
        self.guilds.clone()
    }

    async fn followup(&self, event: &InvocationEvent, text: &str) -> Result<()> {
        if self.fail_followup {
            anyhow::bail!("followup rejected");
        }
        self.ops.lock().unwrap().push("followup".to_string());
        self.followups
            .lock()
            .unwrap()
            .push((event.command.clone(), text.to_string()));
        Ok(())
    }

    async fn delete_original_response(&self, event: &InvocationEvent) -> Result<()> {
        self.ops.lock().unwrap().push("delete".to_string());
        self.deletes.lock().unwrap().push(event.command.clone());
        if self.fail_delete {
            anyhow::bail!("delete rejected");
        }
        Ok(())
    }
}

/// Synthetic direct-message invocation.
pub fn invocation(command: &str) -> InvocationEvent {
    InvocationEvent {
        id: format!("evt-{}", command),
        token: format!("tok-{}", command),
        command: command.to_string(),
        caller: "harper".to_string(),
        guild_id: None,
        guild_name: None,
        args: Vec::new(),
    }
}

/// Synthetic invocation from inside a guild.
pub fn guild_invocation(command: &str, guild_name: &str) -> InvocationEvent {
    let mut event = invocation(command);
    event.guild_id = Some("42".to_string());
    event.guild_name = Some(guild_name.to_string());
    event
}

/// Synthetic invocation carrying named arguments.
pub fn invocation_with_args(command: &str, args: Vec<(&str, &str)>) -> InvocationEvent {
    let mut event = invocation(command);
    event.args = args
        .into_iter()
        .map(|(name, value)| CommandArg::new(name, value))
        .collect();
    event
}

pub fn guild(name: &str, members: u64) -> GuildInfo {
    GuildInfo {
        id: name.to_string(),
        name: name.to_string(),
        member_count: members,
    }
}
