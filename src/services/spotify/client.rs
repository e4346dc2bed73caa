use chrono::{DateTime, Utc};
use reqwest::Client;
use url::Url;

use crate::ports::source::{SourcePlaylist, SourceServiceClient, SourceTrack};
use crate::ports::{Page, ServiceError};
use crate::spotify_rs::client::{
    SPOTIFY_SERVICE, get_current_user_playlists_page, get_playlist, get_playlist_tracks_page,
    get_track,
};
use crate::spotify_rs::types::{SpotifyPaging, SpotifyPlaylist, SpotifyPlaylistItem, SpotifyTrack};

/// [`SourceServiceClient`] backed by the Spotify Web API.
pub struct SpotifyHttpAdapter {
    client: Client,
    base_url: Url,
    access_token: String,
}

impl SpotifyHttpAdapter {
    pub fn new(client: Client, base_url: Url, access_token: String) -> Self {
        Self {
            client,
            base_url,
            access_token,
        }
    }
}

/// Local files have no id and cannot be matched.
fn from_spotify_track(track: SpotifyTrack, added_at: DateTime<Utc>) -> Option<SourceTrack> {
    Some(SourceTrack {
        id: track.id?,
        title: track.name,
        artists: track.artists.into_iter().map(|a| a.name).collect(),
        isrc: track
            .external_ids
            .and_then(|ids| ids.isrc)
            .filter(|isrc| !isrc.is_empty()),
        added_at,
    })
}

/// Converts a playlist item, skipping removed tracks and local files.
fn to_source_track(item: SpotifyPlaylistItem) -> Option<SourceTrack> {
    from_spotify_track(
        item.track?,
        item.added_at.unwrap_or(DateTime::<Utc>::UNIX_EPOCH),
    )
}

fn to_source_playlist(playlist: SpotifyPlaylist) -> SourcePlaylist {
    SourcePlaylist {
        id: playlist.id,
        title: playlist.name,
    }
}

fn to_playlist_page(paging: SpotifyPaging<Option<SpotifyPlaylist>>) -> Page<SourcePlaylist> {
    let fetched = paging.items.len();
    Page::with_fetched(
        paging.items.into_iter().flatten().map(to_source_playlist).collect(),
        paging.total,
        fetched,
    )
}

fn to_page(paging: SpotifyPaging<SpotifyPlaylistItem>) -> Page<SourceTrack> {
    let fetched = paging.items.len();
    Page::with_fetched(
        paging.items.into_iter().filter_map(to_source_track).collect(),
        paging.total,
        fetched,
    )
}

#[async_trait::async_trait]
impl SourceServiceClient for SpotifyHttpAdapter {
    async fn user_playlists_page(
        &self,
        offset: usize,
        limit: usize,
    ) -> Result<Page<SourcePlaylist>, ServiceError> {
        let paging = get_current_user_playlists_page(
            &self.client,
            &self.base_url,
            &self.access_token,
            offset,
            limit,
        )
        .await?;
        Ok(to_playlist_page(paging))
    }

    async fn get_playlist(&self, playlist_id: &str) -> Result<SourcePlaylist, ServiceError> {
        let playlist =
            get_playlist(&self.client, &self.base_url, &self.access_token, playlist_id).await?;
        Ok(to_source_playlist(playlist))
    }

    async fn get_track(&self, track_id: &str) -> Result<SourceTrack, ServiceError> {
        let track = get_track(&self.client, &self.base_url, &self.access_token, track_id).await?;
        from_spotify_track(track, DateTime::<Utc>::UNIX_EPOCH).ok_or_else(|| {
            ServiceError::NotFound {
                service: SPOTIFY_SERVICE,
                what: format!("track {track_id}"),
            }
        })
    }

    async fn playlist_tracks_page(
        &self,
        playlist_id: &str,
        offset: usize,
        limit: usize,
    ) -> Result<Page<SourceTrack>, ServiceError> {
        let paging = get_playlist_tracks_page(
            &self.client,
            &self.base_url,
            &self.access_token,
            playlist_id,
            offset,
            limit,
        )
        .await?;
        Ok(to_page(paging))
    }
}
