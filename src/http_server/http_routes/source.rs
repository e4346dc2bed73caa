use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
};

use crate::http_server::{error::ApiError, state::AppState};
use crate::ports::source::{SourcePlaylist, SourceServiceClient, SourceTrack};
use crate::ports::target::TargetServiceClient;
use crate::services::sync::matcher::TrackMatch;

/// Lists the playlists in the source user's library.
pub async fn playlists<S, T>(
    State(app_state): State<Arc<AppState<S, T>>>,
) -> Result<Json<Vec<SourcePlaylist>>, ApiError>
where
    S: SourceServiceClient + 'static,
    T: TargetServiceClient + 'static,
{
    let playlists = app_state.orchestrator().source_playlists().await?;
    Ok(Json(playlists))
}

pub async fn playlist_tracks<S, T>(
    State(app_state): State<Arc<AppState<S, T>>>,
    Path(playlist_id): Path<String>,
) -> Result<Json<Vec<SourceTrack>>, ApiError>
where
    S: SourceServiceClient + 'static,
    T: TargetServiceClient + 'static,
{
    let tracks = app_state
        .orchestrator()
        .source_playlist_tracks(&playlist_id)
        .await?;
    Ok(Json(tracks))
}

/// Finds the target catalog entry a sync would pick for one source track.
pub async fn match_track<S, T>(
    State(app_state): State<Arc<AppState<S, T>>>,
    Path(track_id): Path<String>,
) -> Result<Json<TrackMatch>, ApiError>
where
    S: SourceServiceClient + 'static,
    T: TargetServiceClient + 'static,
{
    let found = app_state
        .orchestrator()
        .match_source_track(&track_id)
        .await?;
    found.map(Json).ok_or(ApiError::NoMatch(track_id))
}
