// ABOUTME: Registered command set built once at ready time from the builtin registry.
// ABOUTME: Command definitions, handler trait, registration policy, and result classification.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::events::InvocationEvent;
use crate::gateway::Gateway;

/// Declared precondition a caller must satisfy before a handler runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precondition {
    /// Only usable inside a guild
    GuildOnly,
    /// Only usable in a direct message
    DirectOnly,
}

impl Precondition {
    /// Check against an invocation; Err carries the caller-visible reason.
    pub fn check(&self, event: &InvocationEvent) -> Result<(), String> {
        match self {
            Precondition::GuildOnly if event.guild_id.is_none() => {
                Err("this command can only be used in a server".to_string())
            }
            Precondition::DirectOnly if event.guild_id.is_some() => {
                Err("this command can only be used in a direct message".to_string())
            }
            _ => Ok(()),
        }
    }
}

/// Declared argument shape for one command parameter.
#[derive(Debug, Clone)]
pub struct ArgDef {
    pub name: String,
    pub description: String,
    pub required: bool,
}

/// Declared shape of a registered command: name, description, arguments,
/// and preconditions.
#[derive(Debug, Clone)]
pub struct CommandDef {
    pub name: String,
    pub description: String,
    pub args: Vec<ArgDef>,
    pub preconditions: Vec<Precondition>,
}

impl CommandDef {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            args: Vec::new(),
            preconditions: Vec::new(),
        }
    }

    pub fn arg(
        mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        required: bool,
    ) -> Self {
        self.args.push(ArgDef {
            name: name.into(),
            description: description.into(),
            required,
        });
        self
    }

    pub fn guild_only(mut self) -> Self {
        self.preconditions.push(Precondition::GuildOnly);
        self
    }

    pub fn direct_only(mut self) -> Self {
        self.preconditions.push(Precondition::DirectOnly);
        self
    }

    pub fn required_args(&self) -> usize {
        self.args.iter().filter(|arg| arg.required).count()
    }

    /// First unmet precondition, if any.
    pub fn check_preconditions(&self, event: &InvocationEvent) -> Result<(), String> {
        for precondition in &self.preconditions {
            precondition.check(event)?;
        }
        Ok(())
    }

    /// Whether the supplied argument count fits the declared shape.
    pub fn args_valid(&self, event: &InvocationEvent) -> bool {
        let supplied = event.args.len();
        supplied >= self.required_args() && supplied <= self.args.len()
    }

    /// Platform command names: lowercase, no whitespace, bounded length.
    fn has_valid_name(&self) -> bool {
        !self.name.is_empty()
            && self.name.len() <= 32
            && self
                .name
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_')
    }
}

/// How a handler finished when it did not fail outright.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerStatus {
    /// Handler ran and delivered its own output
    Completed,
    /// Handler declined to execute for an unspecified reason
    NotExecuted,
}

/// Trait implemented by every slash command handler.
///
/// Handlers communicate success output themselves through gateway follow-ups;
/// the dispatcher only classifies and reports failures.
#[async_trait]
pub trait SlashCommandHandler: Send + Sync {
    /// Declared shape used for registration and validation
    fn definition(&self) -> CommandDef;

    /// Execute against one invocation
    async fn run(
        &self,
        gateway: Arc<dyn Gateway>,
        event: &InvocationEvent,
    ) -> Result<HandlerStatus>;
}

/// A command after registration: its declared shape plus the handler.
#[derive(Clone)]
pub struct RegisteredCommand {
    pub def: CommandDef,
    pub handler: Arc<dyn SlashCommandHandler>,
}

/// What to do when a command fails local validation during registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistrationPolicy {
    /// Reject startup on any invalid command
    #[default]
    Fail,
    /// Drop invalid commands with a warning and keep going
    Skip,
}

impl std::str::FromStr for RegistrationPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fail" => Ok(RegistrationPolicy::Fail),
            "skip" => Ok(RegistrationPolicy::Skip),
            other => Err(format!("unknown registration policy '{}'", other)),
        }
    }
}

/// Immutable lookup table from command name to registered command.
///
/// Built exactly once during ready initialization and shared read-only by
/// concurrent dispatch tasks afterwards.
pub struct CommandRegistry {
    commands: HashMap<String, RegisteredCommand>,
}

impl CommandRegistry {
    /// Build the registry from a set of handlers, validating each definition.
    pub fn build(
        handlers: Vec<Arc<dyn SlashCommandHandler>>,
        policy: RegistrationPolicy,
    ) -> Result<Self> {
        let mut commands: HashMap<String, RegisteredCommand> = HashMap::new();

        for handler in handlers {
            let def = handler.definition();
            let problem = if !def.has_valid_name() {
                Some("invalid command name".to_string())
            } else if commands.contains_key(&def.name) {
                Some("duplicate command name".to_string())
            } else {
                None
            };

            if let Some(reason) = problem {
                match policy {
                    RegistrationPolicy::Fail => {
                        anyhow::bail!("command '{}' failed to register: {}", def.name, reason)
                    }
                    RegistrationPolicy::Skip => {
                        tracing::warn!(command = %def.name, reason = %reason, "Skipping invalid command");
                        continue;
                    }
                }
            }

            commands.insert(def.name.clone(), RegisteredCommand { def, handler });
        }

        Ok(Self { commands })
    }

    pub fn get(&self, name: &str) -> Option<&RegisteredCommand> {
        self.commands.get(name)
    }

    /// Definitions in stable name order, for platform registration.
    pub fn definitions(&self) -> Vec<CommandDef> {
        let mut defs: Vec<CommandDef> = self.commands.values().map(|c| c.def.clone()).collect();
        defs.sort_by(|a, b| a.name.cmp(&b.name));
        defs
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

/// Outcome of executing one invocation against the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandResult {
    Success,
    Failure(FailureKind),
}

impl CommandResult {
    pub fn is_success(&self) -> bool {
        matches!(self, CommandResult::Success)
    }
}

/// Fixed classification of command failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    /// A declared precondition was not satisfied
    UnmetPrecondition { reason: String },
    /// No registered command under the invoked name
    UnknownCommand,
    /// Supplied arguments do not fit the declared shape
    BadArguments,
    /// The handler returned an error mid-execution
    HandlerError { reason: String },
    /// The handler finished without executing, no further detail
    Unsuccessful,
    /// Anything outside the fixed classification; reported silently
    Other { detail: String },
}
