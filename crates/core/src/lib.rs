//! Harbor Core - Shared types library.
//!
//! Types and contracts shared by the Harbor storefront crates. The core crate
//! performs no I/O: no HTTP clients, no sessions, no runtime.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, emails and prices
//! - [`payment`] - The payment SDK contract (configuration + gateway trait)

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod payment;
pub mod types;

pub use payment::{
    PaymentConfig, PaymentConfigError, PaymentCustomer, PaymentCustomizations, PaymentGateway,
};
pub use types::*;
