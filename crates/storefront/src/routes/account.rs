//! Account route handlers.
//!
//! These routes require authentication.

use std::sync::Arc;

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::State;
use tower_sessions::Session;

use crate::error::{Result, set_sentry_user};
use crate::middleware::auth::RequireAuth;
use crate::models::AdminStatus;
use crate::services::admin_status::AdminStatusTracker;
use crate::services::auth::{AuthContext, remember_admin_status};
use crate::state::AppState;

/// Link to one of the account tabs.
#[derive(Debug, Clone)]
pub struct TabLink {
    pub path: &'static str,
    pub label: &'static str,
}

/// Tabs shown on the account overview, in display order.
pub const ACCOUNT_TABS: &[TabLink] = &[
    TabLink {
        path: "/account/settings",
        label: "Settings",
    },
    TabLink {
        path: "/account/tracking",
        label: "Order Tracking",
    },
];

/// Account overview page template.
#[derive(Template, WebTemplate)]
#[template(path = "account/index.html")]
pub struct AccountIndexTemplate {
    pub email: String,
    pub is_admin: bool,
    pub tabs: &'static [TabLink],
}

/// Settings tab fragment.
#[derive(Template, WebTemplate)]
#[template(path = "account/settings.html")]
pub struct SettingsTab;

/// Order tracking tab fragment.
#[derive(Template, WebTemplate)]
#[template(path = "account/tracking.html")]
pub struct TrackingTab;

/// Display account overview page.
#[tracing::instrument(skip_all, fields(user_id = %user.id))]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
) -> Result<AccountIndexTemplate> {
    set_sentry_user(&user.id, Some(user.email.as_str()));

    let status = resolve_admin_status(&state, &session).await?;

    Ok(AccountIndexTemplate {
        email: user.email.to_string(),
        is_admin: status.is_admin,
        tabs: ACCOUNT_TABS,
    })
}

/// Display the settings tab.
pub async fn settings(RequireAuth(_user): RequireAuth) -> SettingsTab {
    SettingsTab
}

/// Display the order tracking tab.
pub async fn tracking(RequireAuth(_user): RequireAuth) -> TrackingTab {
    TrackingTab
}

/// Run an admin check for the session's user and wait for it to settle.
///
/// For a signed-in user the settled answer is written back to the session
/// so the next request starts from it. Guests get no session write.
///
/// # Errors
///
/// Returns an error if the session store fails. A failed verification is
/// not an error: it resolves to "not an admin".
pub async fn resolve_admin_status(state: &AppState, session: &Session) -> Result<AdminStatus> {
    let context = state.auth_context(session).await?;
    let signed_in = context.user().is_some();

    let tracker = AdminStatusTracker::new(Arc::new(context));
    let status = tracker.resolved().await;

    if signed_in {
        remember_admin_status(session, status).await?;
    }
    Ok(status)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_tab_renders_empty_state() {
        let html = SettingsTab.render().unwrap();
        assert!(html.contains("Settings"));
        assert!(html.contains("Manage your account preferences"));
        assert!(html.contains("No settings available yet."));
    }

    #[test]
    fn test_tracking_tab_renders_empty_state() {
        let html = TrackingTab.render().unwrap();
        assert!(html.contains("Order Tracking"));
        assert!(html.contains("Track the status of your orders"));
        assert!(html.contains("No orders to track."));
    }

    #[test]
    fn test_index_links_every_tab() {
        let html = AccountIndexTemplate {
            email: "ada@shop.test".to_string(),
            is_admin: false,
            tabs: ACCOUNT_TABS,
        }
        .render()
        .unwrap();

        assert!(html.contains("ada@shop.test"));
        assert!(html.contains("href=\"/account/settings\""));
        assert!(html.contains("href=\"/account/tracking\""));
        assert!(!html.contains("Store administrator"));
    }

    #[test]
    fn test_index_shows_admin_badge() {
        let html = AccountIndexTemplate {
            email: "ada@shop.test".to_string(),
            is_admin: true,
            tabs: ACCOUNT_TABS,
        }
        .render()
        .unwrap();

        assert!(html.contains("Store administrator"));
    }
}
