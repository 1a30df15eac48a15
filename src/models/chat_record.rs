use chrono::{DateTime, Utc};
use diesel::prelude::*;
use log::warn;
use serde_json::Value;

use super::chat::{ChatMessage, MessageKind};

#[derive(Debug, Queryable, Selectable, Clone)]
#[diesel(table_name = crate::db::schema::chat_messages)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ChatMessageRecord {
    pub id: i32,
    pub message_id: String,
    pub user_id: String,
    pub kind: String,
    pub text: String,
    pub timestamp: String,
    pub properties: Value,
    pub is_error: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = crate::db::schema::chat_messages)]
pub struct InsertableChatMessage {
    pub message_id: String,
    pub user_id: String,
    pub kind: String,
    pub text: String,
    pub timestamp: String,
    pub properties: Value,
    pub is_error: bool,
}

impl InsertableChatMessage {
    pub fn new(user_id: &str, message: &ChatMessage) -> Self {
        InsertableChatMessage {
            message_id: message.id.clone(),
            user_id: user_id.to_string(),
            kind: message.kind.as_str().to_string(),
            text: message.text.clone(),
            timestamp: message.timestamp.clone(),
            properties: serde_json::to_value(&message.properties)
                .unwrap_or_else(|_| Value::Array(Vec::new())),
            is_error: message.is_error,
        }
    }
}

impl ChatMessageRecord {
    /// Rows with an unknown kind are dropped.
    pub fn into_message(self) -> Option<ChatMessage> {
        let Some(kind) = MessageKind::from_name(&self.kind) else {
            warn!(
                "Skipping chat message {} with unknown kind '{}'",
                self.message_id, self.kind
            );
            return None;
        };

        Some(ChatMessage {
            id: self.message_id,
            kind,
            text: self.text,
            timestamp: self.timestamp,
            properties: serde_json::from_value(self.properties).unwrap_or_default(),
            is_error: self.is_error,
        })
    }
}
