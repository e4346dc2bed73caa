use std::sync::Arc;

use tracing::instrument;

use crate::ports::config_store::ConfigStore;
use crate::ports::source::SourceServiceClient;
use crate::ports::target::TargetServiceClient;
use crate::services::sync::error::SyncError;
use crate::services::sync::orchestrator::{PlaylistSyncOrchestrator, SyncReport};

#[derive(Debug, Default)]
pub struct BatchReport {
    pub succeeded: Vec<SyncReport>,
    pub failed: Vec<(String, SyncError)>,
}

/// Runs playlist syncs one after another. A failing playlist never stops the rest.
pub struct BatchSyncScheduler<S: SourceServiceClient, T: TargetServiceClient> {
    orchestrator: Arc<PlaylistSyncOrchestrator<S, T>>,
    config: Arc<dyn ConfigStore>,
}

impl<S: SourceServiceClient, T: TargetServiceClient> BatchSyncScheduler<S, T> {
    pub fn new(
        orchestrator: Arc<PlaylistSyncOrchestrator<S, T>>,
        config: Arc<dyn ConfigStore>,
    ) -> Self {
        Self {
            orchestrator,
            config,
        }
    }

    pub fn orchestrator(&self) -> &Arc<PlaylistSyncOrchestrator<S, T>> {
        &self.orchestrator
    }

    pub async fn run(&self, playlist_ids: &[String]) -> BatchReport {
        let mut report = BatchReport::default();
        for playlist_id in playlist_ids {
            match self.orchestrator.sync_playlist(playlist_id).await {
                Ok(synced) => report.succeeded.push(synced),
                Err(e) => {
                    tracing::error!(
                        step = ?e.step(),
                        "Failed to sync playlist {}: {}",
                        playlist_id,
                        e
                    );
                    report.failed.push((playlist_id.clone(), e));
                }
            }
        }
        report
    }

    #[instrument(skip(self))]
    pub async fn sync_all_configured(&self) -> BatchReport {
        let playlist_ids = self.config.playlist_ids();
        if playlist_ids.is_empty() {
            tracing::info!("No playlists configured for syncing");
            return BatchReport::default();
        }

        let report = self.run(&playlist_ids).await;
        tracing::info!(
            "Synced {} of {} configured playlists",
            report.succeeded.len(),
            playlist_ids.len()
        );
        report
    }
}
