pub mod json_file;
pub mod memory;
pub mod sqlite;

use std::sync::Arc;

use color_eyre::eyre::Result;

use crate::config::{Config, StateBackend};
use crate::database::Database;
use crate::ports::kv_store::KeyValueStore;
use json_file::JsonFileStore;
use memory::MemoryStore;
use sqlite::SqliteStore;

/// Open the configured state backend.
pub async fn open_store(config: &Config) -> Result<Arc<dyn KeyValueStore>> {
    let store: Arc<dyn KeyValueStore> = match config.state.backend {
        StateBackend::Sqlite => {
            let db = Database::open(&config.state_path()?).await?;
            Arc::new(SqliteStore::new(Arc::new(db)))
        }
        StateBackend::Json => {
            let dir = config.state_path()?;
            tracing::info!("Using JSON state directory: {}", dir.display());
            Arc::new(JsonFileStore::new(dir))
        }
        StateBackend::Memory => {
            tracing::warn!("Using in-memory state; sync progress is lost on exit");
            Arc::new(MemoryStore::new())
        }
    };
    Ok(store)
}
