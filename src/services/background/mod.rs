use std::future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, Notify};

use crate::ports::source::SourceServiceClient;
use crate::ports::target::TargetServiceClient;
use crate::services::sync::BatchSyncScheduler;

/// Spawn the periodic sync task. Returns a Notify handle that wakes the task immediately
/// (e.g. for `POST /sync/all`).
///
/// Every run holds `dispatch_lock`, so it never overlaps a sync started elsewhere.
pub fn spawn_sync_task<S, T>(
    scheduler: Arc<BatchSyncScheduler<S, T>>,
    dispatch_lock: Arc<Mutex<()>>,
    interval: Option<Duration>,
) -> Arc<Notify>
where
    S: SourceServiceClient + 'static,
    T: TargetServiceClient + 'static,
{
    let notify = Arc::new(Notify::new());
    let notify_clone = notify.clone();

    tokio::spawn(async move {
        match interval {
            Some(interval) => tracing::info!("Sync task started, running every {:?}", interval),
            None => tracing::info!("Sync task started, periodic sync disabled"),
        }
        loop {
            tokio::select! {
                _ = notify_clone.notified() => {
                    tracing::debug!("Sync task woken by notification");
                }
                _ = sleep_or_forever(interval) => {
                    tracing::debug!("Sync task woken by timer");
                }
            }

            let _guard = dispatch_lock.lock().await;
            scheduler.sync_all_configured().await;
        }
    });

    notify
}

async fn sleep_or_forever(interval: Option<Duration>) {
    match interval {
        Some(interval) => tokio::time::sleep(interval).await,
        None => future::pending().await,
    }
}
