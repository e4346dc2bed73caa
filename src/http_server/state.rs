use std::sync::Arc;

use tokio::sync::{Mutex, Notify};

use crate::ports::source::SourceServiceClient;
use crate::ports::target::TargetServiceClient;
use crate::services::sync::{BatchSyncScheduler, PlaylistSyncOrchestrator, StatusBroadcaster};

pub struct AppState<S: SourceServiceClient, T: TargetServiceClient> {
    pub scheduler: Arc<BatchSyncScheduler<S, T>>,
    pub broadcaster: Arc<StatusBroadcaster>,
    /// Held for the whole of every sync run, whatever triggered it.
    pub dispatch_lock: Arc<Mutex<()>>,
    /// Wakes the background sync task.
    pub sync_notify: Arc<Notify>,
}

impl<S: SourceServiceClient, T: TargetServiceClient> AppState<S, T> {
    pub fn orchestrator(&self) -> &PlaylistSyncOrchestrator<S, T> {
        self.scheduler.orchestrator()
    }
}
