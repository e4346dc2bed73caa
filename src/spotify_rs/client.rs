use reqwest::Client;
use url::Url;

use crate::api_request::send_json;
use crate::ports::ServiceError;
use crate::spotify_rs::types::{SpotifyPaging, SpotifyPlaylist, SpotifyPlaylistItem, SpotifyTrack};

pub const SPOTIFY_SERVICE: &str = "spotify";
pub const DEFAULT_SPOTIFY_API_URL: &str = "https://api.spotify.com/";

const PLAYLIST_TRACK_FIELDS: &str =
    "total,items(added_at,track(id,name,artists(name),external_ids(isrc)))";

fn endpoint(base_url: &Url, path: &str) -> Result<Url, ServiceError> {
    base_url
        .join(path)
        .map_err(|e| ServiceError::transient(SPOTIFY_SERVICE, format!("invalid url: {e}")))
}

/// Fetch a playlist's id and name.
///
/// Endpoint
/// - `GET /v1/playlists/{id}?fields=id,name`
pub async fn get_playlist(
    client: &Client,
    base_url: &Url,
    access_token: &str,
    playlist_id: &str,
) -> Result<SpotifyPlaylist, ServiceError> {
    let url = endpoint(base_url, &format!("v1/playlists/{playlist_id}"))?;
    let request = client
        .get(url)
        .bearer_auth(access_token)
        .query(&[("fields", "id,name")]);

    send_json(SPOTIFY_SERVICE, request).await
}

/// Fetch one page of a playlist's tracks.
///
/// Endpoint
/// - `GET /v1/playlists/{id}/tracks?offset&limit&fields`
///
/// Spotify caps `limit` at 100.
pub async fn get_playlist_tracks_page(
    client: &Client,
    base_url: &Url,
    access_token: &str,
    playlist_id: &str,
    offset: usize,
    limit: usize,
) -> Result<SpotifyPaging<SpotifyPlaylistItem>, ServiceError> {
    let url = endpoint(base_url, &format!("v1/playlists/{playlist_id}/tracks"))?;
    let request = client.get(url).bearer_auth(access_token).query(&[
        ("offset", offset.to_string()),
        ("limit", limit.to_string()),
        ("fields", PLAYLIST_TRACK_FIELDS.to_string()),
    ]);

    send_json(SPOTIFY_SERVICE, request).await
}

/// Fetch one page of the current user's playlists.
///
/// Endpoint
/// - `GET /v1/me/playlists?offset&limit`
///
/// Spotify caps `limit` at 50.
pub async fn get_current_user_playlists_page(
    client: &Client,
    base_url: &Url,
    access_token: &str,
    offset: usize,
    limit: usize,
) -> Result<SpotifyPaging<Option<SpotifyPlaylist>>, ServiceError> {
    let url = endpoint(base_url, "v1/me/playlists")?;
    let request = client.get(url).bearer_auth(access_token).query(&[
        ("offset", offset.to_string()),
        ("limit", limit.to_string()),
    ]);

    send_json(SPOTIFY_SERVICE, request).await
}

/// Fetch a single track.
///
/// Endpoint
/// - `GET /v1/tracks/{id}`
pub async fn get_track(
    client: &Client,
    base_url: &Url,
    access_token: &str,
    track_id: &str,
) -> Result<SpotifyTrack, ServiceError> {
    let url = endpoint(base_url, &format!("v1/tracks/{track_id}"))?;
    let request = client.get(url).bearer_auth(access_token);

    send_json(SPOTIFY_SERVICE, request).await
}
