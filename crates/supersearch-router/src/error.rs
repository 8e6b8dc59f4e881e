//! Error types for the routing engine.

use supersearch_core::error::SearchError;

/// Errors a responder can surface to the router.
///
/// All of these are caught at the router boundary and converted into the
/// fallback path; none propagate to the presentation layer.
#[derive(Debug, thiserror::Error)]
pub enum ResponderError {
    #[error("backend error: {0}")]
    Backend(String),
    #[error("storage error: {0}")]
    Storage(String),
    #[error("timed out after {0}s")]
    Timeout(u64),
}

impl From<SearchError> for ResponderError {
    fn from(err: SearchError) -> Self {
        match err {
            SearchError::Storage(msg) => ResponderError::Storage(msg),
            other => ResponderError::Backend(other.to_string()),
        }
    }
}

/// Router-internal errors. These describe conditions the router resolves
/// itself (by recording a fault and falling back); they exist so the
/// conditions can be logged with structure.
#[derive(Debug, thiserror::Error)]
pub enum RouterError {
    #[error("unknown handoff target: {0}")]
    UnknownTarget(String),
    #[error("no responders registered")]
    NoResponders,
}
