//! Admin status snapshot.

use serde::{Deserialize, Serialize};

/// Whether the current user administers the store, and whether that answer
/// is still being verified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AdminStatus {
    pub is_admin: bool,
    pub is_checking: bool,
}

impl AdminStatus {
    /// No user, or a user who is not an admin. Nothing in flight.
    pub const NOT_ADMIN: Self = Self {
        is_admin: false,
        is_checking: false,
    };

    /// A settled answer.
    #[must_use]
    pub const fn resolved(is_admin: bool) -> Self {
        Self {
            is_admin,
            is_checking: false,
        }
    }

    /// A check in flight, keeping the previous best-known answer.
    #[must_use]
    pub const fn checking(self) -> Self {
        Self {
            is_admin: self.is_admin,
            is_checking: true,
        }
    }
}
