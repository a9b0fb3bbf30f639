//! Core types for Harbor.
//!
//! Type-safe wrappers for the identity and money values passed between crates.

pub mod email;
pub mod id;
pub mod price;

pub use email::{Email, EmailError};
pub use id::*;
pub use price::{CurrencyCode, Price};
