// ABOUTME: Outcome reporter converting classified command failures into
// ABOUTME: caller-visible follow-up messages on the original interaction.

use crate::commands::{CommandResult, FailureKind};
use crate::events::InvocationEvent;
use crate::gateway::Gateway;

/// Messages for one failure kind, in send order. Success produces none here
/// because handlers deliver their own success output. Unclassified kinds stay
/// silent.
pub fn failure_messages(kind: &FailureKind) -> Vec<String> {
    match kind {
        FailureKind::UnmetPrecondition { reason } => {
            vec![format!("❌ Unmet Precondition: {}", reason)]
        }
        FailureKind::UnknownCommand => vec!["❌ Unknown command".to_string()],
        FailureKind::BadArguments => vec!["❌ Invalid number or arguments".to_string()],
        FailureKind::HandlerError { reason } => vec![
            format!("❌ Command exception: {}", reason),
            "This might be because the server IP needs to be changed.".to_string(),
        ],
        FailureKind::Unsuccessful => vec!["❌ Command could not be executed".to_string()],
        FailureKind::Other { .. } => Vec::new(),
    }
}

/// Surface a command result to the caller.
///
/// Purely reactive: one classification branch fires per failure, replies are
/// appended to the original interaction, and send failures are logged but
/// never escalated. No retries.
pub async fn report(gateway: &dyn Gateway, event: &InvocationEvent, result: &CommandResult) {
    let CommandResult::Failure(kind) = result else {
        return;
    };

    if let FailureKind::Other { detail } = kind {
        tracing::debug!(
            command = %event.command,
            detail = %detail,
            "Unclassified command failure, nothing reported to caller"
        );
        return;
    }

    for message in failure_messages(kind) {
        if let Err(e) = gateway.followup(event, &message).await {
            tracing::warn!(
                command = %event.command,
                error = %e,
                "Failed to deliver outcome message"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unmet_precondition_template() {
        let messages = failure_messages(&FailureKind::UnmetPrecondition {
            reason: "this command can only be used in a server".to_string(),
        });
        assert_eq!(
            messages,
            vec!["❌ Unmet Precondition: this command can only be used in a server"]
        );
    }

    #[test]
    fn test_unknown_command_template() {
        assert_eq!(
            failure_messages(&FailureKind::UnknownCommand),
            vec!["❌ Unknown command"]
        );
    }

    #[test]
    fn test_bad_arguments_template() {
        assert_eq!(
            failure_messages(&FailureKind::BadArguments),
            vec!["❌ Invalid number or arguments"]
        );
    }

    #[test]
    fn test_handler_error_templates() {
        let messages = failure_messages(&FailureKind::HandlerError {
            reason: "connection refused".to_string(),
        });
        assert_eq!(
            messages,
            vec![
                "❌ Command exception: connection refused",
                "This might be because the server IP needs to be changed.",
            ]
        );
    }

    #[test]
    fn test_unsuccessful_template() {
        assert_eq!(
            failure_messages(&FailureKind::Unsuccessful),
            vec!["❌ Command could not be executed"]
        );
    }

    #[test]
    fn test_unclassified_is_silent() {
        let messages = failure_messages(&FailureKind::Other {
            detail: "rate limited".to_string(),
        });
        assert!(messages.is_empty());
    }

    #[test]
    fn test_reason_passes_through_verbatim() {
        let odd_reason = "<internal: stack at 0xdeadbeef>";
        let messages = failure_messages(&FailureKind::HandlerError {
            reason: odd_reason.to_string(),
        });
        assert!(messages[0].ends_with(odd_reason));
    }
}
