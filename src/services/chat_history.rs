use std::collections::HashMap;

use log::error;
use tokio::sync::RwLock;

use crate::{
    db::{self, DocumentStore},
    models::{chat::ChatMessage, chat_record::InsertableChatMessage},
};

/// Append-only conversation log per user.
pub struct ChatHistory {
    store: DocumentStore,
    memory: RwLock<HashMap<String, Vec<ChatMessage>>>,
}

impl ChatHistory {
    pub fn new(store: DocumentStore) -> Self {
        ChatHistory {
            store,
            memory: RwLock::new(HashMap::new()),
        }
    }

    pub async fn append(&self, user_id: &str, messages: &[ChatMessage]) {
        if self.store.is_available() {
            let rows: Vec<InsertableChatMessage> = messages
                .iter()
                .map(|message| InsertableChatMessage::new(user_id, message))
                .collect();

            match self
                .store
                .run(move |connection| db::chat_message::insert(connection, &rows))
                .await
            {
                Ok(_) => return,
                Err(e) => error!("Error saving chat messages: {:?}", e),
            }
        }

        self.memory
            .write()
            .await
            .entry(user_id.to_string())
            .or_default()
            .extend_from_slice(messages);
    }

    /// Messages in timestamp order.
    pub async fn get(&self, user_id: &str) -> Vec<ChatMessage> {
        if self.store.is_available() {
            let owner = user_id.to_string();
            match self
                .store
                .run(move |connection| db::chat_message::get_for_user(connection, &owner))
                .await
            {
                Ok(records) => {
                    return records
                        .into_iter()
                        .filter_map(|record| record.into_message())
                        .collect()
                }
                Err(e) => error!("Error getting chat history: {:?}", e),
            }
        }

        self.memory
            .read()
            .await
            .get(user_id)
            .cloned()
            .unwrap_or_default()
    }

    /// `false` when there was nothing to clear in memory or the database call failed.
    pub async fn clear(&self, user_id: &str) -> bool {
        if self.store.is_available() {
            let owner = user_id.to_string();
            match self
                .store
                .run(move |connection| db::chat_message::delete_for_user(connection, &owner))
                .await
            {
                Ok(_) => return true,
                Err(e) => {
                    error!("Error clearing chat history: {:?}", e);
                    return false;
                }
            }
        }

        match self.memory.write().await.get_mut(user_id) {
            Some(messages) => {
                messages.clear();
                true
            }
            None => false,
        }
    }
}
