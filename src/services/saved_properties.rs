use std::collections::HashMap;

use log::{error, info};
use serde::Serialize;
use tokio::sync::RwLock;

use crate::db::{self, DocumentStore};

/// Where a saved-property list ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Database,
    Memory,
}

/// Per-user saved property ids. Writes go to the database when one is
/// available; any database failure falls through to process memory.
pub struct SavedProperties {
    store: DocumentStore,
    memory: RwLock<HashMap<String, Vec<i64>>>,
}

impl SavedProperties {
    pub fn new(store: DocumentStore) -> Self {
        SavedProperties {
            store,
            memory: RwLock::new(HashMap::new()),
        }
    }

    /// Saves `property_id` for the user and returns the user's full list.
    pub async fn save(&self, user_id: &str, property_id: i64) -> (Vec<i64>, StorageBackend) {
        if self.store.is_available() {
            let owner = user_id.to_string();
            let result = self
                .store
                .run(move |connection| {
                    db::saved_property::insert(connection, &owner, property_id)?;
                    db::saved_property::get_for_user(connection, &owner)
                })
                .await;

            match result {
                Ok(saved) => {
                    info!("Saved property {} for user {}", property_id, user_id);
                    return (saved, StorageBackend::Database);
                }
                Err(e) => error!("Error saving property to database: {:?}", e),
            }
        }

        let mut memory = self.memory.write().await;
        let saved = memory.entry(user_id.to_string()).or_default();
        if !saved.contains(&property_id) {
            saved.push(property_id);
        }

        (saved.clone(), StorageBackend::Memory)
    }

    pub async fn list(&self, user_id: &str) -> Vec<i64> {
        if self.store.is_available() {
            let owner = user_id.to_string();
            match self
                .store
                .run(move |connection| db::saved_property::get_for_user(connection, &owner))
                .await
            {
                Ok(saved) => return saved,
                Err(e) => error!("Error getting saved properties: {:?}", e),
            }
        }

        self.memory
            .read()
            .await
            .get(user_id)
            .cloned()
            .unwrap_or_default()
    }

    /// `true` if the id was in the user's list.
    pub async fn remove(&self, user_id: &str, property_id: i64) -> bool {
        if self.store.is_available() {
            let owner = user_id.to_string();
            match self
                .store
                .run(move |connection| {
                    db::saved_property::delete(connection, &owner, property_id)
                })
                .await
            {
                Ok(deleted) => return deleted > 0,
                Err(e) => error!("Error removing saved property: {:?}", e),
            }
        }

        let mut memory = self.memory.write().await;
        match memory.get_mut(user_id) {
            Some(saved) => {
                let before = saved.len();
                saved.retain(|id| *id != property_id);
                saved.len() != before
            }
            None => false,
        }
    }
}
