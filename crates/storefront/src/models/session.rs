//! Session-related types.
//!
//! Types stored in the session for authentication state.

use serde::{Deserialize, Serialize};

use harbor_core::{Email, UserId};

/// Session-stored user identity.
///
/// Written by the external sign-in flow; the storefront only reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    /// Identity provider's user ID.
    pub id: UserId,
    /// User's email address.
    pub email: Email,
}

/// Session keys for authentication data.
pub mod keys {
    /// Key for storing the current logged-in user.
    pub const CURRENT_USER: &str = "current_user";

    /// Key for the last admin status seen for this session.
    ///
    /// Seeds the synchronous best-known value before a fresh check completes.
    pub const ADMIN_HINT: &str = "admin_hint";
}
