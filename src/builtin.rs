// ABOUTME: Builtin command handlers shipped with the bot: help, ping, and roll.
// ABOUTME: builtin_handlers() is the static registry scanned at ready time.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use rand::Rng;

use crate::commands::{CommandDef, HandlerStatus, SlashCommandHandler};
use crate::events::InvocationEvent;
use crate::gateway::Gateway;

/// Lists the registered commands.
pub struct HelpCommand {
    summary: String,
}

#[async_trait]
impl SlashCommandHandler for HelpCommand {
    fn definition(&self) -> CommandDef {
        CommandDef::new("help", "List available commands")
    }

    async fn run(
        &self,
        gateway: Arc<dyn Gateway>,
        event: &InvocationEvent,
    ) -> Result<HandlerStatus> {
        gateway.followup(event, &self.summary).await?;
        Ok(HandlerStatus::Completed)
    }
}

/// Liveness check.
pub struct PingCommand;

#[async_trait]
impl SlashCommandHandler for PingCommand {
    fn definition(&self) -> CommandDef {
        CommandDef::new("ping", "Check that the bot is alive")
    }

    async fn run(
        &self,
        gateway: Arc<dyn Gateway>,
        event: &InvocationEvent,
    ) -> Result<HandlerStatus> {
        gateway.followup(event, "Pong!").await?;
        Ok(HandlerStatus::Completed)
    }
}

/// Rolls a die with a configurable number of sides.
pub struct RollCommand;

#[async_trait]
impl SlashCommandHandler for RollCommand {
    fn definition(&self) -> CommandDef {
        CommandDef::new("roll", "Roll a random number").arg(
            "sides",
            "Number of sides on the die (default 6)",
            false,
        )
    }

    async fn run(
        &self,
        gateway: Arc<dyn Gateway>,
        event: &InvocationEvent,
    ) -> Result<HandlerStatus> {
        let sides: u32 = match event.arg("sides") {
            Some(raw) => raw
                .parse()
                .map_err(|_| anyhow::anyhow!("'{}' is not a valid number of sides", raw))?,
            None => 6,
        };
        if sides == 0 {
            // A zero-sided die cannot be rolled.
            return Ok(HandlerStatus::NotExecuted);
        }

        let rolled = rand::thread_rng().gen_range(1..=sides);
        gateway
            .followup(event, &format!("🎲 You rolled a {} (1-{})", rolled, sides))
            .await?;
        Ok(HandlerStatus::Completed)
    }
}

fn render_summary(defs: &[CommandDef]) -> String {
    let mut lines = vec!["Available commands:".to_string()];
    lines.push("/help - List available commands".to_string());
    for def in defs {
        lines.push(format!("/{} - {}", def.name, def.description));
    }
    lines.join("\n")
}

/// The static registry of handlers registered at ready time.
pub fn builtin_handlers() -> Vec<Arc<dyn SlashCommandHandler>> {
    let mut handlers: Vec<Arc<dyn SlashCommandHandler>> =
        vec![Arc::new(PingCommand), Arc::new(RollCommand)];

    let defs: Vec<CommandDef> = handlers.iter().map(|h| h.definition()).collect();
    handlers.push(Arc::new(HelpCommand {
        summary: render_summary(&defs),
    }));
    handlers
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_set_contents() {
        let handlers = builtin_handlers();
        let names: Vec<String> = handlers.iter().map(|h| h.definition().name).collect();
        assert!(names.contains(&"help".to_string()));
        assert!(names.contains(&"ping".to_string()));
        assert!(names.contains(&"roll".to_string()));
    }

    #[test]
    fn test_help_summary_lists_all_commands() {
        let defs = vec![PingCommand.definition(), RollCommand.definition()];
        let summary = render_summary(&defs);
        assert!(summary.contains("/help - "));
        assert!(summary.contains("/ping - "));
        assert!(summary.contains("/roll - "));
    }

    #[test]
    fn test_roll_declares_optional_sides() {
        let def = RollCommand.definition();
        assert_eq!(def.args.len(), 1);
        assert!(!def.args[0].required);
        assert_eq!(def.required_args(), 0);
    }
}
