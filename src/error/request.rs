//! # Request Error
//! Errors observed by the caller waiting on a [`PendingRequest`].
//!
//! [`PendingRequest`]: crate::client::tracker::PendingRequest
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum RequestError {
    /// The tracker was dropped without ever completing the request.
    #[error("request was abandoned before reaching a terminal state")]
    Abandoned,
}
