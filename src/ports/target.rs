use serde::Serialize;

use crate::ports::{Page, ServiceError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaType {
    Songs,
}

impl MediaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Songs => "songs",
        }
    }
}

/// A catalog search result from the target service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetCatalogEntry {
    pub id: String,
    pub title: String,
    pub artist_name: String,
    pub isrc: Option<String>,
}

/// A playlist in the user's target library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetLibraryPlaylist {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
}

/// Port trait wrapping the target service capabilities used by the sync engine.
///
/// Implementations live in `services::apple_music::client` (production) or test mocks.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait TargetServiceClient: Send + Sync {
    async fn library_playlists_page(
        &self,
        offset: usize,
        limit: usize,
    ) -> Result<Page<TargetLibraryPlaylist>, ServiceError>;

    async fn create_playlist(
        &self,
        title: &str,
        description: &str,
    ) -> Result<TargetLibraryPlaylist, ServiceError>;

    async fn search_catalog(
        &self,
        term: &str,
        media_type: MediaType,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<TargetCatalogEntry>, ServiceError>;

    async fn add_tracks_to_playlist(
        &self,
        playlist_id: &str,
        entry_ids: &[String],
    ) -> Result<(), ServiceError>;
}
