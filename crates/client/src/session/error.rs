//! Session error types.

use thiserror::Error;

/// Errors that can occur during session operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] retailcloud_core::EmailError),

    /// The remote auth service rejected the call or was unreachable.
    ///
    /// Carries the user-facing message assembled from the richest available
    /// error payload; bad credentials and transport failures are
    /// distinguished only by that message.
    #[error("{0}")]
    Remote(String),

    /// The issued identity token could not be decoded.
    #[error("session credential could not be decoded")]
    InvalidCredential,

    /// The supplied identity token is already expired.
    #[error("session credential is expired")]
    ExpiredCredential,
}
