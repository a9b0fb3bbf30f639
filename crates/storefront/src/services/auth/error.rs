//! Authentication error types.

use thiserror::Error;

/// Errors that can occur while reading identity or verifying admin rights.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The session store failed.
    #[error("session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// The admin check could not reach an answer.
    #[error("admin verification failed: {0}")]
    Verification(String),
}
