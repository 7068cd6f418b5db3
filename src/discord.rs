// ABOUTME: Discord transport adapter implementing the Gateway trait over serenity.
// ABOUTME: Forwards ready, guild, and interaction events into the typed event channel.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use anyhow::{Context as _, Result};
use async_trait::async_trait;
use serenity::all::{
    ActivityData, Command as GlobalCommand, CommandDataOptionValue, CommandInteraction,
    CommandOptionType, Context, CreateCommand, CreateCommandOption,
    CreateInteractionResponseFollowup, EventHandler, GatewayIntents, Guild, Interaction, Ready,
    UnavailableGuild,
};
use serenity::http::Http;
use serenity::model::event::ResumedEvent;
use serenity::Client;
use tokio::sync::mpsc;

use crate::commands::CommandDef;
use crate::events::{
    CommandArg, GatewayEvent, GuildInfo, InvocationEvent, LogEvent, ReadyInfo, Severity,
};
use crate::gateway::{EventReceiver, Gateway};

/// State shared between the event handler and the Gateway methods.
///
/// The context and http handle become available once the connection is up;
/// the guild map tracks create/delete events for the membership snapshot.
#[derive(Default)]
struct SharedState {
    ctx: RwLock<Option<Context>>,
    http: RwLock<Option<Arc<Http>>>,
    guilds: RwLock<HashMap<u64, GuildInfo>>,
}

/// Serenity event handler forwarding parsed events into the typed channel.
struct Forwarder {
    shared: Arc<SharedState>,
    tx: mpsc::Sender<GatewayEvent>,
}

impl Forwarder {
    async fn forward(&self, event: GatewayEvent) {
        if self.tx.send(event).await.is_err() {
            tracing::warn!("Gateway event receiver dropped, event discarded");
        }
    }

    fn invocation_event(&self, command: &CommandInteraction) -> InvocationEvent {
        let guild_id = command.guild_id.map(|id| id.get().to_string());
        let guild_name = command.guild_id.and_then(|id| {
            self.shared
                .guilds
                .read()
                .unwrap()
                .get(&id.get())
                .map(|g| g.name.clone())
        });
        let args = command
            .data
            .options
            .iter()
            .map(|option| CommandArg::new(option.name.to_string(), option_value_text(&option.value)))
            .collect();

        InvocationEvent {
            id: command.id.get().to_string(),
            token: command.token.clone(),
            command: command.data.name.to_string(),
            caller: command.user.name.to_string(),
            guild_id,
            guild_name,
            args,
        }
    }
}

#[async_trait]
impl EventHandler for Forwarder {
    async fn ready(&self, ctx: Context, ready: Ready) {
        *self.shared.ctx.write().unwrap() = Some(ctx);
        let bot_name = ready.user.name.to_string();
        self.forward(GatewayEvent::Log(LogEvent::new(
            Severity::Info,
            "gateway",
            format!("Connected as {}", bot_name),
        )))
        .await;
        self.forward(GatewayEvent::Ready(ReadyInfo {
            bot_name,
            guild_count: ready.guilds.len(),
        }))
        .await;
    }

    async fn guild_create(&self, _ctx: Context, guild: Guild, _is_new: Option<bool>) {
        let info = GuildInfo {
            id: guild.id.get().to_string(),
            name: guild.name.to_string(),
            member_count: guild.member_count,
        };
        self.shared.guilds.write().unwrap().insert(guild.id.get(), info);
    }

    async fn guild_delete(&self, _ctx: Context, incomplete: UnavailableGuild, _full: Option<Guild>) {
        self.shared.guilds.write().unwrap().remove(&incomplete.id.get());
    }

    async fn resume(&self, _ctx: Context, _event: ResumedEvent) {
        self.forward(GatewayEvent::Log(LogEvent::new(
            Severity::Verbose,
            "gateway",
            "Session resumed",
        )))
        .await;
    }

    async fn interaction_create(&self, _ctx: Context, interaction: Interaction) {
        if let Interaction::Command(command) = interaction {
            let event = self.invocation_event(&command);
            self.forward(GatewayEvent::Invocation(event)).await;
        }
    }
}

fn option_value_text(value: &CommandDataOptionValue) -> String {
    match value {
        CommandDataOptionValue::String(s) => s.to_string(),
        CommandDataOptionValue::Integer(i) => i.to_string(),
        CommandDataOptionValue::Number(n) => n.to_string(),
        CommandDataOptionValue::Boolean(b) => b.to_string(),
        other => format!("{:?}", other),
    }
}

fn build_command(def: &CommandDef) -> CreateCommand {
    let mut command = CreateCommand::new(def.name.clone()).description(def.description.clone());
    for arg in &def.args {
        command = command.add_option(
            CreateCommandOption::new(
                CommandOptionType::String,
                arg.name.clone(),
                arg.description.clone(),
            )
            .required(arg.required),
        );
    }
    command
}

/// Gateway implementation backed by a serenity client.
pub struct DiscordGateway {
    shared: Arc<SharedState>,
}

impl DiscordGateway {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(SharedState::default()),
        }
    }

    fn context(&self) -> Result<Context> {
        self.shared
            .ctx
            .read()
            .unwrap()
            .clone()
            .context("gateway not ready")
    }

    fn http(&self) -> Result<Arc<Http>> {
        self.shared
            .http
            .read()
            .unwrap()
            .clone()
            .context("gateway not connected")
    }
}

impl Default for DiscordGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Gateway for DiscordGateway {
    async fn connect(&self, token: &str) -> Result<EventReceiver> {
        let (tx, rx) = mpsc::channel(256);
        let handler = Forwarder {
            shared: Arc::clone(&self.shared),
            tx,
        };

        let client = Client::builder(token, GatewayIntents::GUILDS)
            .event_handler(handler)
            .await
            .context("failed to build gateway client")?;
        *self.shared.http.write().unwrap() = Some(Arc::clone(&client.http));

        // The wire loop (heartbeats, resumes, reconnects) lives on its own task.
        tokio::spawn(async move {
            let mut client = client;
            if let Err(e) = client.start().await {
                tracing::error!(error = %e, "Gateway connection ended");
            }
        });

        Ok(rx)
    }

    async fn register_commands(&self, defs: &[CommandDef]) -> Result<usize> {
        let ctx = self.context()?;
        let commands: Vec<CreateCommand> = defs.iter().map(build_command).collect();
        let registered = GlobalCommand::set_global_commands(&ctx.http, commands)
            .await
            .context("platform rejected global command registration")?;
        Ok(registered.len())
    }

    async fn set_presence(&self, status: &str) -> Result<()> {
        let ctx = self.context()?;
        ctx.set_activity(Some(ActivityData::playing(status)));
        Ok(())
    }

    async fn guilds(&self) -> Vec<GuildInfo> {
        let mut guilds: Vec<GuildInfo> = self
            .shared
            .guilds
            .read()
            .unwrap()
            .values()
            .cloned()
            .collect();
        guilds.sort_by(|a, b| a.name.cmp(&b.name));
        guilds
    }

    async fn followup(&self, event: &InvocationEvent, text: &str) -> Result<()> {
        let http = self.http()?;
        let builder = CreateInteractionResponseFollowup::new().content(text);
        http.create_followup_message(&event.token, &builder, Vec::new())
            .await
            .context("follow-up delivery failed")?;
        Ok(())
    }

    async fn delete_original_response(&self, event: &InvocationEvent) -> Result<()> {
        let http = self.http()?;
        http.get_original_interaction_response(&event.token)
            .await
            .context("no original response to clean up")?;
        http.delete_original_interaction_response(&event.token)
            .await
            .context("failed to delete original response")?;
        Ok(())
    }
}
