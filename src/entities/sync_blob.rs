use sea_orm::entity::prelude::*;

/// One persisted blob of the key-value store.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "sync_blobs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub key: String,
    pub value: Vec<u8>,
    /// Unix timestamp of the last write.
    pub updated_at: i64,
}

impl ActiveModelBehavior for ActiveModel {}
