//! Application state shared across handlers.

use std::sync::Arc;

use tower_sessions::Session;

use crate::config::StorefrontConfig;
use crate::services::auth::{AdminAllowlist, AdminVerifier, AuthError, SessionAuthContext};
use crate::services::chat::{ChatError, ChatService};
use crate::services::query::QueryClient;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// configuration and the long-lived service handles.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    chat: ChatService,
    admin_verifier: Arc<dyn AdminVerifier>,
    admin_queries: QueryClient<bool>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// The admin check uses the allowlist from `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the chat client cannot be built.
    pub fn new(config: StorefrontConfig) -> Result<Self, ChatError> {
        let verifier = Arc::new(AdminAllowlist::new(config.admin_emails.clone()));
        Self::with_verifier(config, verifier)
    }

    /// Create a new application state with a custom admin verifier.
    ///
    /// # Errors
    ///
    /// Returns an error if the chat client cannot be built.
    pub fn with_verifier(
        config: StorefrontConfig,
        admin_verifier: Arc<dyn AdminVerifier>,
    ) -> Result<Self, ChatError> {
        let chat = ChatService::new(config.openai.as_ref())?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                chat,
                admin_verifier,
                admin_queries: QueryClient::new(),
            }),
        })
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the chat assistant.
    #[must_use]
    pub fn chat(&self) -> &ChatService {
        &self.inner.chat
    }

    /// Cache of admin verification results, keyed per user.
    #[must_use]
    pub fn admin_queries(&self) -> &QueryClient<bool> {
        &self.inner.admin_queries
    }

    /// Build the auth context for the request owning `session`.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn auth_context(&self, session: &Session) -> Result<SessionAuthContext, AuthError> {
        SessionAuthContext::load(
            session,
            Arc::clone(&self.inner.admin_verifier),
            self.inner.admin_queries.clone(),
        )
        .await
    }
}
