use serde::{Deserialize, Serialize};

/// Generic Apple Music resource list: `{ "data": [...], "meta": { "total": n } }`.
#[derive(Debug, Clone, Deserialize)]
pub struct AppleMusicResponse<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
    #[serde(default)]
    pub meta: Option<AppleMusicMeta>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppleMusicMeta {
    #[serde(default)]
    pub total: Option<usize>,
}

/* ---------- Library playlists ---------- */

#[derive(Debug, Clone, Deserialize)]
pub struct LibraryPlaylist {
    pub id: String,
    #[serde(default)]
    pub attributes: Option<LibraryPlaylistAttributes>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LibraryPlaylistAttributes {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<PlaylistDescription>,
}

/// Editorial notes. Only `standard` is set on user playlists.
#[derive(Debug, Clone, Deserialize)]
pub struct PlaylistDescription {
    #[serde(default)]
    pub standard: Option<String>,
}

/// Body of `POST /v1/me/library/playlists`.
#[derive(Debug, Clone, Serialize)]
pub struct CreateLibraryPlaylist<'a> {
    pub attributes: CreateLibraryPlaylistAttributes<'a>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateLibraryPlaylistAttributes<'a> {
    pub name: &'a str,
    pub description: &'a str,
}

/// Body of `POST /v1/me/library/playlists/{id}/tracks`.
#[derive(Debug, Clone, Serialize)]
pub struct AddTracksRequest<'a> {
    pub data: Vec<TrackReference<'a>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrackReference<'a> {
    pub id: &'a str,
    #[serde(rename = "type")]
    pub kind: &'a str,
}

/* ---------- Catalog search ---------- */

#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub results: SearchResults,
}

/// Absent result kinds are omitted entirely, so an empty search yields `{}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchResults {
    #[serde(default)]
    pub songs: Option<AppleMusicResponse<Song>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Song {
    pub id: String,
    pub attributes: SongAttributes,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SongAttributes {
    pub name: String,
    #[serde(default)]
    pub artist_name: String,
    #[serde(default)]
    pub isrc: Option<String>,
}
