use thiserror::Error;

use crate::services::xtream::XtreamError;

/// Failure of a slice operation (refresh, info fetch, EPG fetch)
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SyncError {
    /// The session has no complete API config; nothing was requested
    #[error("no api config")]
    NoApiConfig,
    /// A sign out happened while the request was in flight; the result was dropped
    #[error("signed out during request")]
    SignedOut,
    #[error(transparent)]
    Api(#[from] XtreamError),
}

/// Rejected login attempt. Input errors are raised before any request.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum LoginError {
    #[error("Invalid url")]
    InvalidUrl,
    #[error("Username must be provided")]
    MissingUsername,
    #[error("Password must be provided")]
    MissingPassword,
    #[error("There was an error logging in: {0}")]
    Rejected(XtreamError),
    #[error("Signed out before the login finished")]
    SignedOut,
}
