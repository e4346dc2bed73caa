use std::sync::Arc;
use std::time::Duration;

use backon::{ExponentialBuilder, Retryable};

use crate::ports::source::{SourcePlaylist, SourceServiceClient, SourceTrack};
use crate::ports::target::{
    MediaType, TargetCatalogEntry, TargetLibraryPlaylist, TargetServiceClient,
};
use crate::ports::{Page, ServiceError};

/// Exponential backoff applied to every service call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first call. `1` disables retrying.
    pub max_attempts: usize,
    pub min_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            min_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    fn backoff(&self) -> ExponentialBuilder {
        ExponentialBuilder::default()
            .with_min_delay(self.min_delay)
            .with_max_delay(self.max_delay)
            .with_max_times(self.max_attempts.saturating_sub(1))
            .with_jitter()
    }
}

fn log_retry(error: &ServiceError, delay: Duration) {
    tracing::warn!("Retrying after {:?}: {}", delay, error);
}

/// Retries retryable [`ServiceError`]s of the wrapped source client.
pub struct RetryingSourceClient<C: SourceServiceClient> {
    inner: Arc<C>,
    policy: RetryPolicy,
}

impl<C: SourceServiceClient> RetryingSourceClient<C> {
    pub fn new(inner: Arc<C>, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

#[async_trait::async_trait]
impl<C: SourceServiceClient> SourceServiceClient for RetryingSourceClient<C> {
    async fn user_playlists_page(
        &self,
        offset: usize,
        limit: usize,
    ) -> Result<Page<SourcePlaylist>, ServiceError> {
        let inner = &self.inner;
        (move || async move { inner.user_playlists_page(offset, limit).await })
            .retry(self.policy.backoff())
            .when(ServiceError::is_retryable)
            .notify(log_retry)
            .await
    }

    async fn get_playlist(&self, playlist_id: &str) -> Result<SourcePlaylist, ServiceError> {
        let inner = &self.inner;
        (move || async move { inner.get_playlist(playlist_id).await })
            .retry(self.policy.backoff())
            .when(ServiceError::is_retryable)
            .notify(log_retry)
            .await
    }

    async fn get_track(&self, track_id: &str) -> Result<SourceTrack, ServiceError> {
        let inner = &self.inner;
        (move || async move { inner.get_track(track_id).await })
            .retry(self.policy.backoff())
            .when(ServiceError::is_retryable)
            .notify(log_retry)
            .await
    }

    async fn playlist_tracks_page(
        &self,
        playlist_id: &str,
        offset: usize,
        limit: usize,
    ) -> Result<Page<SourceTrack>, ServiceError> {
        let inner = &self.inner;
        (move || async move { inner.playlist_tracks_page(playlist_id, offset, limit).await })
            .retry(self.policy.backoff())
            .when(ServiceError::is_retryable)
            .notify(log_retry)
            .await
    }
}

/// Retries retryable [`ServiceError`]s of the wrapped target client.
///
/// Adding tracks is not idempotent, so it is attempted exactly once.
pub struct RetryingTargetClient<C: TargetServiceClient> {
    inner: Arc<C>,
    policy: RetryPolicy,
}

impl<C: TargetServiceClient> RetryingTargetClient<C> {
    pub fn new(inner: Arc<C>, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

#[async_trait::async_trait]
impl<C: TargetServiceClient> TargetServiceClient for RetryingTargetClient<C> {
    async fn library_playlists_page(
        &self,
        offset: usize,
        limit: usize,
    ) -> Result<Page<TargetLibraryPlaylist>, ServiceError> {
        let inner = &self.inner;
        (move || async move { inner.library_playlists_page(offset, limit).await })
            .retry(self.policy.backoff())
            .when(ServiceError::is_retryable)
            .notify(log_retry)
            .await
    }

    async fn create_playlist(
        &self,
        title: &str,
        description: &str,
    ) -> Result<TargetLibraryPlaylist, ServiceError> {
        let inner = &self.inner;
        (move || async move { inner.create_playlist(title, description).await })
            .retry(self.policy.backoff())
            .when(ServiceError::is_retryable)
            .notify(log_retry)
            .await
    }

    async fn search_catalog(
        &self,
        term: &str,
        media_type: MediaType,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<TargetCatalogEntry>, ServiceError> {
        let inner = &self.inner;
        (move || async move { inner.search_catalog(term, media_type, limit, offset).await })
            .retry(self.policy.backoff())
            .when(ServiceError::is_retryable)
            .notify(log_retry)
            .await
    }

    async fn add_tracks_to_playlist(
        &self,
        playlist_id: &str,
        entry_ids: &[String],
    ) -> Result<(), ServiceError> {
        self.inner
            .add_tracks_to_playlist(playlist_id, entry_ids)
            .await
    }
}
