//! JSON API routes.

pub mod account;
pub mod chat;
