//! Business logic services.
//!
//! Services are independent of HTTP: route handlers pull what they need out
//! of [`AppState`](crate::state::AppState) and call into these.
//!
//! - [`query`] - keyed async result cache with invalidation
//! - [`auth`] - the signed-in user and the admin check
//! - [`admin_status`] - observable admin status with stale-check protection
//! - [`chat`] - shopping assistant backed by a chat completion API

pub mod admin_status;
pub mod auth;
pub mod chat;
pub mod query;
