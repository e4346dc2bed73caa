//! Boundaries between the sync engine and everything it talks to.
//!
//! Each trait here is implemented by an HTTP adapter in `services` for production and by a
//! `mockall` mock in tests.

pub mod config_store;
pub mod kv_store;
pub mod source;
pub mod target;

use reqwest::StatusCode;

/// One page of a paginated listing, as reported by the remote service.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Total number of entries the service says exist, when it reports one.
    pub total: Option<usize>,
    /// Raw entries the service returned for this page, including any the adapter skipped.
    pub fetched: usize,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: Option<usize>) -> Self {
        let fetched = items.len();
        Self {
            items,
            total,
            fetched,
        }
    }

    /// A page whose adapter dropped some of the `fetched` raw entries.
    pub fn with_fetched(items: Vec<T>, total: Option<usize>, fetched: usize) -> Self {
        Self {
            items,
            total,
            fetched,
        }
    }
}

/// Failure of a call into a source or target service.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ServiceError {
    /// Network failure or an unexpected response from the service.
    #[error("{service} request failed: {message}")]
    Transient {
        service: &'static str,
        status: Option<u16>,
        message: String,
    },
    #[error("{service}: {what} not found")]
    NotFound { service: &'static str, what: String },
}

impl ServiceError {
    pub fn transient(service: &'static str, message: impl Into<String>) -> Self {
        Self::Transient {
            service,
            status: None,
            message: message.into(),
        }
    }

    pub fn from_status(service: &'static str, status: StatusCode, body: String) -> Self {
        if status == StatusCode::NOT_FOUND {
            return Self::NotFound {
                service,
                what: if body.is_empty() {
                    "resource".to_string()
                } else {
                    body
                },
            };
        }
        Self::Transient {
            service,
            status: Some(status.as_u16()),
            message: format!("{status}: {body}"),
        }
    }

    pub fn from_reqwest(service: &'static str, error: reqwest::Error) -> Self {
        match error.status() {
            Some(status) => Self::from_status(service, status, error.to_string()),
            None => Self::transient(service, error.to_string()),
        }
    }

    /// Network errors, rate limiting and server-side failures are worth another attempt.
    /// Auth failures, bad requests and missing resources are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transient { status: None, .. } => true,
            Self::Transient {
                status: Some(status),
                ..
            } => *status == 429 || (500..=599).contains(status),
            Self::NotFound { .. } => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_status_maps_to_not_found() {
        let err = ServiceError::from_status("spotify", StatusCode::NOT_FOUND, "playlist".into());
        assert!(matches!(err, ServiceError::NotFound { .. }));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_retryable_statuses() {
        let retryable = [429, 500, 502, 503];
        for status in retryable {
            let err = ServiceError::from_status(
                "apple-music",
                StatusCode::from_u16(status).unwrap(),
                String::new(),
            );
            assert!(err.is_retryable(), "{status} should be retryable");
        }

        let final_statuses = [400, 401, 403];
        for status in final_statuses {
            let err = ServiceError::from_status(
                "apple-music",
                StatusCode::from_u16(status).unwrap(),
                String::new(),
            );
            assert!(!err.is_retryable(), "{status} should not be retryable");
        }

        assert!(ServiceError::transient("spotify", "connection reset").is_retryable());
    }
}
