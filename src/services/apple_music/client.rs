use reqwest::Client;
use url::Url;

use crate::apple_music_rs::client::{
    AppleMusicAuth, add_tracks_to_library_playlist, create_library_playlist,
    get_library_playlists_page, search_catalog,
};
use crate::apple_music_rs::types::{LibraryPlaylist, Song};
use crate::ports::target::{
    MediaType, TargetCatalogEntry, TargetLibraryPlaylist, TargetServiceClient,
};
use crate::ports::{Page, ServiceError};

/// [`TargetServiceClient`] backed by the Apple Music API.
pub struct AppleMusicHttpAdapter {
    client: Client,
    base_url: Url,
    auth: AppleMusicAuth,
    storefront: String,
}

impl AppleMusicHttpAdapter {
    pub fn new(client: Client, base_url: Url, auth: AppleMusicAuth, storefront: String) -> Self {
        Self {
            client,
            base_url,
            auth,
            storefront,
        }
    }
}

impl From<LibraryPlaylist> for TargetLibraryPlaylist {
    fn from(playlist: LibraryPlaylist) -> Self {
        let (title, description) = match playlist.attributes {
            Some(attributes) => (
                attributes.name,
                attributes.description.and_then(|d| d.standard),
            ),
            None => (String::new(), None),
        };
        Self {
            id: playlist.id,
            title,
            description,
        }
    }
}

impl From<Song> for TargetCatalogEntry {
    fn from(song: Song) -> Self {
        Self {
            id: song.id,
            title: song.attributes.name,
            artist_name: song.attributes.artist_name,
            isrc: song.attributes.isrc.filter(|isrc| !isrc.is_empty()),
        }
    }
}

#[async_trait::async_trait]
impl TargetServiceClient for AppleMusicHttpAdapter {
    async fn library_playlists_page(
        &self,
        offset: usize,
        limit: usize,
    ) -> Result<Page<TargetLibraryPlaylist>, ServiceError> {
        let response =
            get_library_playlists_page(&self.client, &self.base_url, &self.auth, offset, limit)
                .await?;
        Ok(Page::new(
            response.data.into_iter().map(Into::into).collect(),
            response.meta.and_then(|meta| meta.total),
        ))
    }

    async fn create_playlist(
        &self,
        title: &str,
        description: &str,
    ) -> Result<TargetLibraryPlaylist, ServiceError> {
        let created =
            create_library_playlist(&self.client, &self.base_url, &self.auth, title, description)
                .await?;
        let mut playlist = TargetLibraryPlaylist::from(created);
        // The create response may omit attributes
        if playlist.title.is_empty() {
            playlist.title = title.to_string();
        }
        if playlist.description.is_none() {
            playlist.description = Some(description.to_string());
        }
        Ok(playlist)
    }

    async fn search_catalog(
        &self,
        term: &str,
        media_type: MediaType,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<TargetCatalogEntry>, ServiceError> {
        let songs = search_catalog(
            &self.client,
            &self.base_url,
            &self.auth,
            &self.storefront,
            term,
            media_type.as_str(),
            limit,
            offset,
        )
        .await?;
        Ok(songs.into_iter().map(Into::into).collect())
    }

    async fn add_tracks_to_playlist(
        &self,
        playlist_id: &str,
        entry_ids: &[String],
    ) -> Result<(), ServiceError> {
        add_tracks_to_library_playlist(
            &self.client,
            &self.base_url,
            &self.auth,
            playlist_id,
            entry_ids,
        )
        .await
    }
}
