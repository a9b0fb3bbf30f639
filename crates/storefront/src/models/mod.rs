//! Domain models for the storefront.
//!
//! Nothing here is persisted: identities arrive through the session, admin
//! status is recomputed per user, and chat messages live for one request.

pub mod admin_status;
pub mod chat;
pub mod session;

pub use admin_status::AdminStatus;
pub use chat::{ChatMessage, ChatRole};
pub use session::{CurrentUser, keys as session_keys};
