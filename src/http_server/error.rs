use axum::{
    Json,
    body::Body,
    http::{Response, StatusCode},
    response::IntoResponse,
};
use serde_json::json;

use crate::services::sync::{ErrorKind, SyncError};

/// A failed call, rendered as `{"message": ...}` with a status matching the error kind.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Sync(#[from] SyncError),
    #[error("no match in target catalog for track {0}")]
    NoMatch(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        let kind = match self {
            ApiError::Sync(err) => err.kind(),
            ApiError::NoMatch(_) => return StatusCode::NOT_FOUND,
        };
        match kind {
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::TransientService => StatusCode::BAD_GATEWAY,
            ErrorKind::StateCorruption | ErrorKind::Persistence => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response<Body> {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("{:?}", self);
        } else {
            tracing::debug!("Request failed: {}", self);
        }

        (status, Json(json!({ "message": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::ServiceError;
    use crate::services::sync::error::SyncStep;

    #[test]
    fn test_status_per_error_kind() {
        let validation = ApiError::from(SyncError::Validation {
            what: "playlist",
            id: String::new(),
        });
        let not_found = ApiError::from(SyncError::Service {
            step: SyncStep::FetchPlaylist,
            source: ServiceError::NotFound {
                service: "spotify",
                what: "playlist".into(),
            },
        });
        let upstream = ApiError::from(SyncError::Service {
            step: SyncStep::AddTracks,
            source: ServiceError::transient("apple-music", "reset"),
        });

        assert_eq!(validation.status(), StatusCode::BAD_REQUEST);
        assert_eq!(not_found.status(), StatusCode::NOT_FOUND);
        assert_eq!(upstream.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(
            ApiError::NoMatch("t1".into()).status(),
            StatusCode::NOT_FOUND
        );
    }
}
