use reqwest::{Client, RequestBuilder};
use url::Url;

use crate::api_request::{send_json, send_no_content};
use crate::apple_music_rs::types::{
    AddTracksRequest, AppleMusicResponse, CreateLibraryPlaylist, CreateLibraryPlaylistAttributes,
    LibraryPlaylist, SearchResponse, Song, TrackReference,
};
use crate::ports::ServiceError;

pub const APPLE_MUSIC_SERVICE: &str = "apple-music";
pub const DEFAULT_APPLE_MUSIC_API_URL: &str = "https://api.music.apple.com/";

/// Developer token plus the user token that grants access to one library.
#[derive(Debug, Clone)]
pub struct AppleMusicAuth {
    pub developer_token: String,
    pub user_token: String,
}

impl AppleMusicAuth {
    fn apply(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .bearer_auth(&self.developer_token)
            .header("Music-User-Token", &self.user_token)
    }
}

fn endpoint(base_url: &Url, path: &str) -> Result<Url, ServiceError> {
    base_url
        .join(path)
        .map_err(|e| ServiceError::transient(APPLE_MUSIC_SERVICE, format!("invalid url: {e}")))
}

/// Fetch one page of the user's library playlists.
///
/// Endpoint
/// - `GET /v1/me/library/playlists?offset&limit`
pub async fn get_library_playlists_page(
    client: &Client,
    base_url: &Url,
    auth: &AppleMusicAuth,
    offset: usize,
    limit: usize,
) -> Result<AppleMusicResponse<LibraryPlaylist>, ServiceError> {
    let url = endpoint(base_url, "v1/me/library/playlists")?;
    let request = auth.apply(client.get(url)).query(&[
        ("offset", offset.to_string()),
        ("limit", limit.to_string()),
    ]);

    send_json(APPLE_MUSIC_SERVICE, request).await
}

/// Create a library playlist.
///
/// Endpoint
/// - `POST /v1/me/library/playlists`
pub async fn create_library_playlist(
    client: &Client,
    base_url: &Url,
    auth: &AppleMusicAuth,
    name: &str,
    description: &str,
) -> Result<LibraryPlaylist, ServiceError> {
    let url = endpoint(base_url, "v1/me/library/playlists")?;
    let body = CreateLibraryPlaylist {
        attributes: CreateLibraryPlaylistAttributes { name, description },
    };
    let request = auth.apply(client.post(url)).json(&body);

    let created: AppleMusicResponse<LibraryPlaylist> =
        send_json(APPLE_MUSIC_SERVICE, request).await?;
    created.data.into_iter().next().ok_or_else(|| {
        ServiceError::transient(APPLE_MUSIC_SERVICE, "create playlist returned no playlist")
    })
}

/// Search the storefront catalog.
///
/// Endpoint
/// - `GET /v1/catalog/{storefront}/search?term&types&limit&offset`
///
/// Returns an empty list when the search has no results of the requested type.
#[allow(clippy::too_many_arguments)]
pub async fn search_catalog(
    client: &Client,
    base_url: &Url,
    auth: &AppleMusicAuth,
    storefront: &str,
    term: &str,
    types: &str,
    limit: usize,
    offset: usize,
) -> Result<Vec<Song>, ServiceError> {
    let url = endpoint(base_url, &format!("v1/catalog/{storefront}/search"))?;
    let request = auth.apply(client.get(url)).query(&[
        ("term", term.to_string()),
        ("types", types.to_string()),
        ("limit", limit.to_string()),
        ("offset", offset.to_string()),
    ]);

    let response: SearchResponse = send_json(APPLE_MUSIC_SERVICE, request).await?;
    Ok(response
        .results
        .songs
        .map(|songs| songs.data)
        .unwrap_or_default())
}

/// Append catalog songs to a library playlist.
///
/// Endpoint
/// - `POST /v1/me/library/playlists/{id}/tracks`
pub async fn add_tracks_to_library_playlist(
    client: &Client,
    base_url: &Url,
    auth: &AppleMusicAuth,
    playlist_id: &str,
    song_ids: &[String],
) -> Result<(), ServiceError> {
    let url = endpoint(base_url, &format!("v1/me/library/playlists/{playlist_id}/tracks"))?;
    let body = AddTracksRequest {
        data: song_ids
            .iter()
            .map(|id| TrackReference { id, kind: "songs" })
            .collect(),
    };
    let request = auth.apply(client.post(url)).json(&body);

    send_no_content(APPLE_MUSIC_SERVICE, request).await
}
