use std::sync::Arc;

use sea_orm::sea_query::OnConflict;
use sea_orm::{ActiveValue, EntityTrait};

use crate::database::Database;
use crate::entities::sync_blob;
use crate::ports::kv_store::{KeyValueStore, StoreError};

/// Stores blobs in the `sync_blobs` table, one row per key.
pub struct SqliteStore {
    db: Arc<Database>,
}

impl SqliteStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }
}

#[async_trait::async_trait]
impl KeyValueStore for SqliteStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let row = sync_blob::Entity::find_by_id(key.to_string())
            .one(&self.db.conn)
            .await?;
        Ok(row.map(|r| r.value))
    }

    async fn put(&self, key: &str, value: Vec<u8>) -> Result<(), StoreError> {
        let blob = sync_blob::ActiveModel {
            key: ActiveValue::Set(key.to_string()),
            value: ActiveValue::Set(value),
            updated_at: ActiveValue::Set(chrono::Utc::now().timestamp()),
        };

        sync_blob::Entity::insert(blob)
            .on_conflict(
                OnConflict::column(sync_blob::Column::Key)
                    .update_columns([sync_blob::Column::Value, sync_blob::Column::UpdatedAt])
                    .to_owned(),
            )
            .exec(&self.db.conn)
            .await?;

        Ok(())
    }
}
