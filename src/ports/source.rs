use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::ports::{Page, ServiceError};

/// Playlist metadata from the source catalog.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourcePlaylist {
    pub id: String,
    pub title: String,
}

/// A track entry of a source playlist, decoupled from the service's API types.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceTrack {
    pub id: String,
    pub title: String,
    pub artists: Vec<String>,
    pub isrc: Option<String>,
    /// When the track was added to the playlist. The Unix epoch for tracks looked up on their
    /// own.
    pub added_at: DateTime<Utc>,
}

impl SourceTrack {
    /// All artist names joined by a single space, in credit order.
    pub fn joined_artists(&self) -> String {
        self.artists.join(" ")
    }
}

/// Port trait wrapping the source service capabilities used by the sync engine.
///
/// Implementations live in `services::spotify::client` (production) or test mocks.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait SourceServiceClient: Send + Sync {
    /// One page of the playlists in the authorized user's library.
    async fn user_playlists_page(
        &self,
        offset: usize,
        limit: usize,
    ) -> Result<Page<SourcePlaylist>, ServiceError>;

    async fn get_playlist(&self, playlist_id: &str) -> Result<SourcePlaylist, ServiceError>;

    async fn get_track(&self, track_id: &str) -> Result<SourceTrack, ServiceError>;

    async fn playlist_tracks_page(
        &self,
        playlist_id: &str,
        offset: usize,
        limit: usize,
    ) -> Result<Page<SourceTrack>, ServiceError>;
}
