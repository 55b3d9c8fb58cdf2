//! NPC dialogue: message model, the remote reply client and its worker
//! dispatcher, and history persistence.

mod dispatcher;
mod history;
mod reply;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub(crate) use dispatcher::{ReplyCompletion, ReplyDispatcher, ReplyRequest};
pub(crate) use history::{HistoryStore, HISTORY_BLOB_KEY};
pub(crate) use reply::{GeminiReplyService, ReplyClientConfig, ReplyError, ReplyService};

/// NPC identity to its messages in creation order.
pub(crate) type ConversationHistory = BTreeMap<String, Vec<Message>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) enum Role {
    #[serde(rename = "user")]
    User,
    #[serde(rename = "model")]
    Npc,
}

impl Role {
    pub(crate) fn as_wire(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Npc => "model",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct Message {
    pub(crate) role: Role,
    pub(crate) text: String,
    /// Milliseconds since the Unix epoch.
    pub(crate) timestamp: i64,
}

impl Message {
    pub(crate) fn user(text: impl Into<String>) -> Self {
        Self::now(Role::User, text.into())
    }

    pub(crate) fn npc(text: impl Into<String>) -> Self {
        Self::now(Role::Npc, text.into())
    }

    fn now(role: Role, text: String) -> Self {
        Self {
            role,
            text,
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_serializes_with_wire_roles() {
        let message = Message {
            role: Role::Npc,
            text: "Hello".to_string(),
            timestamp: 1_700_000_000_000,
        };
        let json = serde_json::to_value(&message).expect("serialize");

        assert_eq!(
            json,
            serde_json::json!({"role": "model", "text": "Hello", "timestamp": 1_700_000_000_000i64})
        );
    }

    #[test]
    fn new_messages_carry_current_timestamp() {
        let before = chrono::Utc::now().timestamp_millis();
        let message = Message::user("hi");

        assert_eq!(message.role, Role::User);
        assert!(message.timestamp >= before);
    }
}
