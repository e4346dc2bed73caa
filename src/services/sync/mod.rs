pub mod error;
pub mod matcher;
pub mod mirror;
pub mod orchestrator;
pub mod pagination;
pub mod scheduler;
pub mod state_store;
pub mod status;

pub use error::{ErrorKind, SyncError};
pub use orchestrator::{PlaylistSyncOrchestrator, SyncReport};
pub use scheduler::BatchSyncScheduler;
pub use state_store::{GlobalSyncState, SyncStateStore};
pub use status::{StatusBroadcaster, StatusMessage};
