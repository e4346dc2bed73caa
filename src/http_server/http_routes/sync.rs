use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;

use crate::http_server::{error::ApiError, state::AppState};
use crate::ports::source::SourceServiceClient;
use crate::ports::target::TargetServiceClient;
use crate::services::sync::mirror::MirroredPlaylist;
use crate::services::sync::{GlobalSyncState, SyncReport};

pub async fn ping() -> &'static str {
    "pong"
}

/// Runs one playlist sync and waits for it to finish.
pub async fn sync_playlist<S, T>(
    State(app_state): State<Arc<AppState<S, T>>>,
    Path(playlist_id): Path<String>,
) -> Result<Json<SyncReport>, ApiError>
where
    S: SourceServiceClient + 'static,
    T: TargetServiceClient + 'static,
{
    let _guard = app_state.dispatch_lock.lock().await;
    let report = app_state.orchestrator().sync_playlist(&playlist_id).await?;
    Ok(Json(report))
}

/// Wakes the background task to sync every configured playlist.
pub async fn sync_all<S, T>(State(app_state): State<Arc<AppState<S, T>>>) -> impl IntoResponse
where
    S: SourceServiceClient + 'static,
    T: TargetServiceClient + 'static,
{
    app_state.sync_notify.notify_one();
    (
        StatusCode::ACCEPTED,
        Json(json!({ "message": "sync of all configured playlists started" })),
    )
}

pub async fn sync_state<S, T>(
    State(app_state): State<Arc<AppState<S, T>>>,
) -> Result<Json<GlobalSyncState>, ApiError>
where
    S: SourceServiceClient + 'static,
    T: TargetServiceClient + 'static,
{
    let state = app_state.orchestrator().state_store().read().await?;
    Ok(Json(state))
}

pub async fn mirrors<S, T>(
    State(app_state): State<Arc<AppState<S, T>>>,
) -> Result<Json<Vec<MirroredPlaylist>>, ApiError>
where
    S: SourceServiceClient + 'static,
    T: TargetServiceClient + 'static,
{
    let mirrors = app_state.orchestrator().list_mirrors().await?;
    Ok(Json(mirrors))
}
