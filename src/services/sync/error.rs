use std::fmt;

use crate::ports::ServiceError;
use crate::ports::kv_store::StoreError;

/// The orchestration step a service failure happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStep {
    ListSourcePlaylists,
    FetchTrack,
    FetchPlaylist,
    FetchTracks,
    ListMirrors,
    CreateMirror,
    MatchTracks,
    AddTracks,
}

impl fmt::Display for SyncStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let step = match self {
            SyncStep::ListSourcePlaylists => "list source playlists",
            SyncStep::FetchTrack => "fetch source track",
            SyncStep::FetchPlaylist => "fetch source playlist",
            SyncStep::FetchTracks => "fetch source playlist tracks",
            SyncStep::ListMirrors => "list target library playlists",
            SyncStep::CreateMirror => "create mirror playlist",
            SyncStep::MatchTracks => "match tracks in target catalog",
            SyncStep::AddTracks => "add tracks to mirror playlist",
        };
        f.write_str(step)
    }
}

/// Coarse classification used by callers that only care about the kind of failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    TransientService,
    NotFound,
    StateCorruption,
    Validation,
    Persistence,
}

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("invalid {what} id `{id}`")]
    Validation { what: &'static str, id: String },
    #[error("failed to {step}: {source}")]
    Service {
        step: SyncStep,
        #[source]
        source: ServiceError,
    },
    #[error("persisted sync state is corrupt: {0}")]
    StateCorruption(#[source] serde_json::Error),
    #[error("failed to persist sync state: {0}")]
    Persistence(#[from] StoreError),
}

impl SyncError {
    /// Wraps a service failure with the step it happened in, for use with `map_err`.
    pub fn at(step: SyncStep) -> impl FnOnce(ServiceError) -> SyncError {
        move |source| SyncError::Service { step, source }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            SyncError::Validation { .. } => ErrorKind::Validation,
            SyncError::Service {
                source: ServiceError::NotFound { .. },
                ..
            } => ErrorKind::NotFound,
            SyncError::Service { .. } => ErrorKind::TransientService,
            SyncError::StateCorruption(_) => ErrorKind::StateCorruption,
            SyncError::Persistence(_) => ErrorKind::Persistence,
        }
    }

    pub fn step(&self) -> Option<SyncStep> {
        match self {
            SyncError::Service { step, .. } => Some(*step),
            _ => None,
        }
    }
}

/// Source ids are base62 strings; anything else never reaches a service.
fn validate_source_id(what: &'static str, id: &str) -> Result<(), SyncError> {
    if id.is_empty() || !id.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(SyncError::Validation {
            what,
            id: id.to_string(),
        });
    }
    Ok(())
}

pub fn validate_playlist_id(playlist_id: &str) -> Result<(), SyncError> {
    validate_source_id("playlist", playlist_id)
}

pub fn validate_track_id(track_id: &str) -> Result<(), SyncError> {
    validate_source_id("track", track_id)
}
