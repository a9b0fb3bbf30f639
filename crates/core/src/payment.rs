//! Payment SDK contract.
//!
//! Checkout hands payment collection to a third-party inline SDK. Harbor
//! never implements that SDK; this module only describes what it is given
//! (a public key plus a [`PaymentConfig`]) and what it exposes
//! ([`PaymentGateway::initialize_payment`]).
//!
//! The serialized form of [`PaymentConfig`] is the object the SDK expects:
//!
//! ```json
//! {
//!   "tx_ref": "order-1001",
//!   "amount": 19.99,
//!   "currency": "USD",
//!   "payment_options": "card",
//!   "customer": { "email": "shopper@example.com", "phone_number": null, "name": "Ada" },
//!   "customizations": { "title": "Harbor", "description": "Order 1001", "logo": null }
//! }
//! ```

use std::future::Future;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{CurrencyCode, Email, Price, TransactionRef};

/// Payment methods offered when the caller does not choose.
pub const DEFAULT_PAYMENT_OPTIONS: &str = "card";

/// Errors raised while assembling a [`PaymentConfig`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PaymentConfigError {
    /// Amount is zero or negative.
    #[error("payment amount must be positive (got {0})")]
    NonPositiveAmount(Decimal),
    /// Transaction reference is blank.
    #[error("transaction reference cannot be empty")]
    EmptyTransactionRef,
}

/// Customer details forwarded to the payment SDK.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentCustomer {
    pub email: Email,
    pub phone_number: Option<String>,
    pub name: Option<String>,
}

/// Branding shown in the payment modal.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PaymentCustomizations {
    pub title: Option<String>,
    pub description: Option<String>,
    pub logo: Option<String>,
}

/// Configuration object consumed by the payment SDK.
///
/// Field names match the SDK's contract; Harbor does not interpret them
/// beyond the validation in [`PaymentConfig::new`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentConfig {
    pub tx_ref: TransactionRef,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub currency: CurrencyCode,
    pub payment_options: String,
    pub customer: PaymentCustomer,
    #[serde(default)]
    pub customizations: PaymentCustomizations,
}

impl PaymentConfig {
    /// Build a configuration for charging `price` to `customer_email`.
    ///
    /// # Errors
    ///
    /// Returns an error if the reference is blank or the price is not positive.
    pub fn new(
        tx_ref: TransactionRef,
        price: Price,
        customer_email: Email,
    ) -> Result<Self, PaymentConfigError> {
        if tx_ref.as_str().trim().is_empty() {
            return Err(PaymentConfigError::EmptyTransactionRef);
        }
        if !price.is_positive() {
            return Err(PaymentConfigError::NonPositiveAmount(price.amount));
        }

        Ok(Self {
            tx_ref,
            amount: price.amount,
            currency: price.currency_code,
            payment_options: DEFAULT_PAYMENT_OPTIONS.to_string(),
            customer: PaymentCustomer {
                email: customer_email,
                phone_number: None,
                name: None,
            },
            customizations: PaymentCustomizations::default(),
        })
    }

    /// Set the customer's display name.
    #[must_use]
    pub fn with_customer_name(mut self, name: impl Into<String>) -> Self {
        self.customer.name = Some(name.into());
        self
    }

    /// Set the customer's phone number.
    #[must_use]
    pub fn with_phone_number(mut self, phone_number: impl Into<String>) -> Self {
        self.customer.phone_number = Some(phone_number.into());
        self
    }

    /// Restrict the payment methods offered (e.g. `"card, banktransfer"`).
    #[must_use]
    pub fn with_payment_options(mut self, options: impl Into<String>) -> Self {
        self.payment_options = options.into();
        self
    }

    /// Replace the modal branding.
    #[must_use]
    pub fn with_customizations(mut self, customizations: PaymentCustomizations) -> Self {
        self.customizations = customizations;
        self
    }

    /// The amount and currency as a [`Price`].
    #[must_use]
    pub const fn price(&self) -> Price {
        Price::new(self.amount, self.currency)
    }
}

/// Construction and invocation contract of a payment SDK.
///
/// Implementations wrap a concrete provider. The result of
/// [`initialize_payment`](Self::initialize_payment) is provider-defined.
pub trait PaymentGateway: Sized {
    /// Provider-defined result of starting a payment.
    type Output;
    /// Provider-defined failure.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Create a gateway for one payment.
    fn new(public_key: String, config: PaymentConfig) -> Self;

    /// Start the payment flow.
    fn initialize_payment(&self) -> impl Future<Output = Result<Self::Output, Self::Error>> + Send;
}
