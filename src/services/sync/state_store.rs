use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ports::kv_store::KeyValueStore;
use crate::services::sync::error::SyncError;

/// Key the whole [`GlobalSyncState`] blob is stored under.
pub const SYNC_STATE_KEY: &str = "sync-state";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GlobalSyncState {
    #[serde(default)]
    pub syncing: bool,
    #[serde(default)]
    pub playlists: BTreeMap<String, PlaylistSyncState>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistSyncState {
    #[serde(rename = "last-sync-date")]
    pub last_sync_date: DateTime<Utc>,
}

impl GlobalSyncState {
    /// Last successful sync of a playlist, or the beginning of time if it was never synced.
    pub fn last_sync_date(&self, playlist_id: &str) -> DateTime<Utc> {
        self.playlists
            .get(playlist_id)
            .map(|p| p.last_sync_date)
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    /// Records a successful sync. The stored date never moves backwards.
    pub fn record_sync(&mut self, playlist_id: &str, synced_at: DateTime<Utc>) {
        let last_sync_date = synced_at.max(self.last_sync_date(playlist_id));
        self.playlists
            .insert(playlist_id.to_string(), PlaylistSyncState { last_sync_date });
    }
}

/// Reads and writes the [`GlobalSyncState`] as one JSON blob.
///
/// There is no versioning: two concurrent read-modify-write cycles can lose an update, so callers
/// serialize runs themselves.
#[derive(Clone)]
pub struct SyncStateStore {
    store: Arc<dyn KeyValueStore>,
}

impl SyncStateStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub async fn read(&self) -> Result<GlobalSyncState, SyncError> {
        let Some(blob) = self.store.get(SYNC_STATE_KEY).await? else {
            return Ok(GlobalSyncState::default());
        };
        // A freshly created backing file is empty rather than missing
        if blob.iter().all(u8::is_ascii_whitespace) {
            return Ok(GlobalSyncState::default());
        }
        serde_json::from_slice(&blob).map_err(SyncError::StateCorruption)
    }

    pub async fn write(&self, state: &GlobalSyncState) -> Result<(), SyncError> {
        let blob = serde_json::to_vec_pretty(state).map_err(SyncError::StateCorruption)?;
        self.store.put(SYNC_STATE_KEY, blob).await?;
        Ok(())
    }
}
