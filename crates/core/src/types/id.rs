//! Newtype IDs for identities issued by external services.
//!
//! Harbor does not own a user table: identities come from the sign-in
//! provider as opaque strings. The `define_id!` macro wraps them so that IDs
//! of different kinds cannot be mixed up.

/// Macro to define an opaque, string-backed ID wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`, `Display`
/// - Conversion methods: `new()`, `as_str()`, `into_inner()`
///
/// # Example
///
/// ```rust
/// # use harbor_core::define_id;
/// define_id!(UserId);
/// define_id!(TransactionRef);
///
/// let user_id = UserId::new("usr_1");
/// let tx_ref = TransactionRef::new("usr_1");
///
/// // These are different types, so this won't compile:
/// // let _: UserId = tx_ref;
/// assert_eq!(user_id.as_str(), tx_ref.as_str());
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new ID from any string-like value.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Borrow the underlying string.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the ID and return the underlying string.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }
    };
}

define_id!(UserId);
define_id!(TransactionRef);
