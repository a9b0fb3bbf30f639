//! Authentication context.
//!
//! Sign-in is handled outside the storefront; what the storefront needs is
//! a read/verify view of the signed-in user, expressed by [`AuthContext`]:
//!
//! - [`AuthContext::user`] - the signed-in user, if any
//! - [`AuthContext::is_admin`] - best-known admin flag, available synchronously
//! - [`AuthContext::check_is_admin`] - authoritative async admin check
//!
//! [`SessionAuthContext`] implements the contract on top of the request
//! session and an [`AdminVerifier`]. Verification results are cached per user
//! through a [`QueryClient`].

mod error;

pub use error::AuthError;

use std::sync::Arc;

use futures::future::BoxFuture;
use harbor_core::Email;
use tower_sessions::Session;
use tracing::{debug, instrument};

use crate::models::{AdminStatus, CurrentUser, session_keys};
use crate::services::query::{QueryClient, QueryKey, QueryOptions};

/// Query namespace for cached admin verification results.
pub const ADMIN_STATUS_QUERY: &str = "admin-status";

/// Read/verify view of the signed-in user.
pub trait AuthContext: Send + Sync {
    /// The signed-in user, or `None` for guests.
    fn user(&self) -> Option<CurrentUser>;

    /// Best-known admin flag, without doing any I/O.
    fn is_admin(&self) -> bool;

    /// Verify whether the signed-in user administers the store.
    fn check_is_admin(&self) -> BoxFuture<'_, Result<bool, AuthError>>;
}

/// Decides whether a user holds administrative privileges.
pub trait AdminVerifier: Send + Sync {
    fn verify<'a>(&'a self, user: &'a CurrentUser) -> BoxFuture<'a, Result<bool, AuthError>>;
}

/// Admin verifier backed by a configured list of email addresses.
#[derive(Debug, Clone, Default)]
pub struct AdminAllowlist {
    emails: Vec<Email>,
}

impl AdminAllowlist {
    #[must_use]
    pub const fn new(emails: Vec<Email>) -> Self {
        Self { emails }
    }
}

impl AdminVerifier for AdminAllowlist {
    fn verify<'a>(&'a self, user: &'a CurrentUser) -> BoxFuture<'a, Result<bool, AuthError>> {
        let is_admin = self.emails.iter().any(|email| email.matches(&user.email));
        Box::pin(async move { Ok(is_admin) })
    }
}

/// [`AuthContext`] for one request, read from its session.
#[derive(Clone)]
pub struct SessionAuthContext {
    user: Option<CurrentUser>,
    admin_hint: bool,
    verifier: Arc<dyn AdminVerifier>,
    queries: QueryClient<bool>,
}

impl SessionAuthContext {
    /// Build a context from explicit parts.
    #[must_use]
    pub fn new(
        user: Option<CurrentUser>,
        admin_hint: bool,
        verifier: Arc<dyn AdminVerifier>,
        queries: QueryClient<bool>,
    ) -> Self {
        Self {
            user,
            admin_hint,
            verifier,
            queries,
        }
    }

    /// Read the signed-in user and the last known admin flag from `session`.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn load(
        session: &Session,
        verifier: Arc<dyn AdminVerifier>,
        queries: QueryClient<bool>,
    ) -> Result<Self, AuthError> {
        let user = session
            .get::<CurrentUser>(session_keys::CURRENT_USER)
            .await?;
        let admin_hint = session
            .get::<bool>(session_keys::ADMIN_HINT)
            .await?
            .unwrap_or(false);

        Ok(Self::new(user, admin_hint, verifier, queries))
    }
}

impl AuthContext for SessionAuthContext {
    fn user(&self) -> Option<CurrentUser> {
        self.user.clone()
    }

    fn is_admin(&self) -> bool {
        self.user.is_some() && self.admin_hint
    }

    fn check_is_admin(&self) -> BoxFuture<'_, Result<bool, AuthError>> {
        Box::pin(self.verify_current_user())
    }
}

impl SessionAuthContext {
    #[instrument(skip(self), fields(user_id = self.user.as_ref().map(|u| u.id.as_str())))]
    async fn verify_current_user(&self) -> Result<bool, AuthError> {
        // Guests never reach the verifier; a disabled query yields `None`.
        let user = self.user.as_ref();
        let key = QueryKey::new(ADMIN_STATUS_QUERY).with(user.map_or("", |u| u.id.as_str()));
        let options = QueryOptions::enabled_if(user.is_some());

        let verifier = Arc::clone(&self.verifier);
        let is_admin = self
            .queries
            .fetch(key, options, || async move {
                match user {
                    Some(user) => verifier.verify(user).await,
                    None => Ok(false),
                }
            })
            .await
            .map_err(|err| AuthError::Verification(err.to_string()))?
            .unwrap_or(false);

        debug!(is_admin, "Admin verification complete");
        Ok(is_admin)
    }
}

/// Remember a settled admin status in the session so the next request can
/// seed [`AuthContext::is_admin`] with it.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn remember_admin_status(
    session: &Session,
    status: AdminStatus,
) -> Result<(), AuthError> {
    if !status.is_checking {
        session
            .insert(session_keys::ADMIN_HINT, status.is_admin)
            .await?;
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use harbor_core::UserId;

    use super::*;

    fn user(email: &str) -> CurrentUser {
        CurrentUser {
            id: UserId::new(format!("id-{email}")),
            email: Email::parse(email).unwrap(),
        }
    }

    fn allowlist(emails: &[&str]) -> Arc<dyn AdminVerifier> {
        Arc::new(AdminAllowlist::new(
            emails.iter().map(|e| Email::parse(e).unwrap()).collect(),
        ))
    }

    struct CountingVerifier {
        calls: AtomicUsize,
        answer: Result<bool, String>,
    }

    impl AdminVerifier for CountingVerifier {
        fn verify<'a>(&'a self, _user: &'a CurrentUser) -> BoxFuture<'a, Result<bool, AuthError>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let answer = self.answer.clone().map_err(AuthError::Verification);
            Box::pin(async move { answer })
        }
    }

    #[tokio::test]
    async fn test_allowlist_matches_case_insensitively() {
        let verifier = allowlist(&["Owner@Shop.test"]);
        assert!(verifier.verify(&user("owner@shop.test")).await.unwrap());
        assert!(!verifier.verify(&user("guest@shop.test")).await.unwrap());
    }

    #[tokio::test]
    async fn test_guest_is_never_admin() {
        let ctx = SessionAuthContext::new(None, true, allowlist(&[]), QueryClient::new());
        assert!(ctx.user().is_none());
        assert!(!ctx.is_admin());
        assert!(!ctx.check_is_admin().await.unwrap());
    }

    #[tokio::test]
    async fn test_guest_check_skips_verifier() {
        let verifier = Arc::new(CountingVerifier {
            calls: AtomicUsize::new(0),
            answer: Ok(true),
        });
        let ctx = SessionAuthContext::new(None, false, verifier.clone(), QueryClient::new());

        assert!(!ctx.check_is_admin().await.unwrap());
        assert_eq!(verifier.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_hint_seeds_synchronous_flag() {
        let ctx = SessionAuthContext::new(
            Some(user("owner@shop.test")),
            true,
            allowlist(&[]),
            QueryClient::new(),
        );
        assert!(ctx.is_admin());
        // The authoritative check still wins.
        assert!(!ctx.check_is_admin().await.unwrap());
    }

    #[tokio::test]
    async fn test_verification_is_cached_per_user() {
        let verifier = Arc::new(CountingVerifier {
            calls: AtomicUsize::new(0),
            answer: Ok(true),
        });
        let queries = QueryClient::new();

        for _ in 0..3 {
            let ctx = SessionAuthContext::new(
                Some(user("owner@shop.test")),
                false,
                verifier.clone(),
                queries.clone(),
            );
            assert!(ctx.check_is_admin().await.unwrap());
        }

        assert_eq!(verifier.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_verification_failure_is_reported() {
        let verifier = Arc::new(CountingVerifier {
            calls: AtomicUsize::new(0),
            answer: Err("directory unavailable".to_string()),
        });
        let ctx = SessionAuthContext::new(
            Some(user("owner@shop.test")),
            false,
            verifier,
            QueryClient::new(),
        );

        let err = ctx.check_is_admin().await.unwrap_err();
        assert!(matches!(err, AuthError::Verification(msg) if msg.contains("directory unavailable")));
    }
}
