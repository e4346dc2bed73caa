use std::sync::Arc;

use color_eyre::eyre::Result;

use crate::apple_music_rs::client::AppleMusicAuth;
use crate::config::Config;
use crate::ports::config_store::ConfigStore;
use crate::services::apple_music::AppleMusicHttpAdapter;
use crate::services::retry::{RetryingSourceClient, RetryingTargetClient};
use crate::services::spotify::SpotifyHttpAdapter;
use crate::services::storage::open_store;
use crate::services::sync::mirror::MirrorNaming;
use crate::services::sync::{
    BatchSyncScheduler, PlaylistSyncOrchestrator, StatusBroadcaster, SyncStateStore,
};

pub type LiveSource = RetryingSourceClient<SpotifyHttpAdapter>;
pub type LiveTarget = RetryingTargetClient<AppleMusicHttpAdapter>;
pub type LiveScheduler = BatchSyncScheduler<LiveSource, LiveTarget>;

/// Everything a sync entry point needs, wired against the real services.
pub struct Engine {
    pub scheduler: Arc<LiveScheduler>,
    pub broadcaster: Arc<StatusBroadcaster>,
}

impl Engine {
    pub async fn build(config: &Config) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .timeout(std::time::Duration::from_secs(30))
            .build()?;
        let retry = config.retry_policy();

        let source = SpotifyHttpAdapter::new(
            http.clone(),
            config.spotify_base_url()?,
            config.spotify_access_token()?,
        );
        let target = AppleMusicHttpAdapter::new(
            http,
            config.apple_music_base_url()?,
            AppleMusicAuth {
                developer_token: config.apple_music_developer_token()?,
                user_token: config.apple_music_user_token()?,
            },
            config.apple_music.storefront.clone(),
        );

        let state = SyncStateStore::new(open_store(config).await?);
        let broadcaster = Arc::new(StatusBroadcaster::new());
        let orchestrator = PlaylistSyncOrchestrator::new(
            Arc::new(RetryingSourceClient::new(Arc::new(source), retry)),
            Arc::new(RetryingTargetClient::new(Arc::new(target), retry)),
            state,
            broadcaster.clone(),
            MirrorNaming {
                prefix: config.mirror_prefix.clone(),
                tool_name: config.tool_name.clone(),
            },
        );

        let config_store: Arc<dyn ConfigStore> = Arc::new(config.clone());
        Ok(Self {
            scheduler: Arc::new(BatchSyncScheduler::new(Arc::new(orchestrator), config_store)),
            broadcaster,
        })
    }
}
