use std::time::Duration;

/// Read-only view of the settings the batch scheduler needs.
pub trait ConfigStore: Send + Sync {
    /// Source playlist ids to keep mirrored, in sync order.
    fn playlist_ids(&self) -> Vec<String>;

    /// How often to run a full sync. `None` disables periodic syncing.
    fn sync_interval(&self) -> Option<Duration>;
}
