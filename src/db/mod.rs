pub mod chat_message;
pub mod saved_property;
pub mod schema;

use anyhow::{anyhow, Context, Result};
use diesel::{Connection, PgConnection, QueryResult};
use log::{info, warn};

use crate::config::Config;

pub fn establish_connection(database_url: &str) -> Result<PgConnection> {
    PgConnection::establish(database_url)
        .with_context(|| format!("Error connecting to {}", redact(database_url)))
}

fn redact(database_url: &str) -> &str {
    // Keep credentials out of the logs
    database_url
        .rsplit_once('@')
        .map(|(_, host)| host)
        .unwrap_or(database_url)
}

/// Optional PostgreSQL backing for saved properties and chat history.
///
/// Availability is decided once at startup. When the database is not
/// reachable the services keep their data in process memory instead.
#[derive(Debug, Clone)]
pub struct DocumentStore {
    database_url: Option<String>,
}

impl DocumentStore {
    pub fn disabled() -> Self {
        DocumentStore { database_url: None }
    }

    pub async fn connect(config: &Config) -> Self {
        let Some(database_url) = config.database_url.clone() else {
            warn!("DATABASE_URL not set, using in-memory storage");
            return DocumentStore::disabled();
        };

        let probe_url = database_url.clone();
        let probe = tokio::task::spawn_blocking(move || establish_connection(&probe_url)).await;

        match probe {
            Ok(Ok(_)) => {
                info!("Connected to database at {}", redact(&database_url));
                DocumentStore {
                    database_url: Some(database_url),
                }
            }
            Ok(Err(e)) => {
                warn!("Database unavailable, using in-memory storage: {:?}", e);
                DocumentStore::disabled()
            }
            Err(e) => {
                warn!("Database probe task failed, using in-memory storage: {:?}", e);
                DocumentStore::disabled()
            }
        }
    }

    pub fn is_available(&self) -> bool {
        self.database_url.is_some()
    }

    /// Runs a blocking diesel operation on its own connection off the async runtime.
    pub async fn run<T, F>(&self, operation: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut PgConnection) -> QueryResult<T> + Send + 'static,
    {
        let database_url = self
            .database_url
            .clone()
            .ok_or_else(|| anyhow!("Database is not configured"))?;

        tokio::task::spawn_blocking(move || {
            let mut connection = establish_connection(&database_url)?;
            operation(&mut connection).map_err(anyhow::Error::from)
        })
        .await
        .context("Database task panicked")?
    }
}
