use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Playlist as returned by `GET /v1/playlists/{id}?fields=id,name`.
#[derive(Debug, Clone, Deserialize)]
pub struct SpotifyPlaylist {
    pub id: String,
    pub name: String,
}

/// Paging object wrapping list endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct SpotifyPaging<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
    #[serde(default)]
    pub total: Option<usize>,
}

/// Entry of a playlist's track list.
///
/// `track` is null for removed or unavailable items, and `added_at` is null for very old
/// playlists.
#[derive(Debug, Clone, Deserialize)]
pub struct SpotifyPlaylistItem {
    #[serde(default)]
    pub added_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub track: Option<SpotifyTrack>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpotifyTrack {
    /// Null for local files.
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub artists: Vec<SpotifyArtist>,
    #[serde(default)]
    pub external_ids: Option<SpotifyExternalIds>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpotifyArtist {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpotifyExternalIds {
    #[serde(default)]
    pub isrc: Option<String>,
}
