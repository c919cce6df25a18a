use super::transcript::{Role, Turn};
use crate::llm::ChatMessage;

/// How the recorded history becomes the message list for a request.
///
/// The shipped policy sends everything; a sliding window or summarizing
/// policy plugs in here without touching the orchestrator. Tool-result
/// turns go out under the `user` role: the endpoint contract has no
/// tool-result role without call-id correlation.
pub trait ContextPolicy: Send + Sync {
    fn assemble(&self, turns: &[Turn]) -> Vec<ChatMessage>;
}

/// Send the full history, oldest first.
#[derive(Debug, Default, Clone, Copy)]
pub struct FullHistory;

impl ContextPolicy for FullHistory {
    fn assemble(&self, turns: &[Turn]) -> Vec<ChatMessage> {
        turns.iter().map(to_wire).collect()
    }
}

pub(crate) fn to_wire(turn: &Turn) -> ChatMessage {
    match turn.role {
        Role::User | Role::ToolResult => ChatMessage::user(turn.content.clone()),
        Role::Assistant => ChatMessage::assistant(turn.content.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::WireRole;

    #[test]
    fn test_full_history_keeps_order_and_maps_roles() {
        let turns = vec![
            Turn::user("add 2 and 3"),
            Turn::tool_result("5"),
            Turn::assistant("the sum is 5"),
        ];

        let messages = FullHistory.assemble(&turns);

        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].role, WireRole::User);
        assert_eq!(messages[0].content, "add 2 and 3");
        assert_eq!(messages[1].role, WireRole::User);
        assert_eq!(messages[2].role, WireRole::Assistant);
    }

    #[test]
    fn test_full_history_empty() {
        assert!(FullHistory.assemble(&[]).is_empty());
    }
}
