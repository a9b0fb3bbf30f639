//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Health check
//!
//! # Account (requires auth)
//! GET  /account                - Account overview
//! GET  /account/settings       - Settings tab (fragment)
//! GET  /account/tracking       - Order tracking tab (fragment)
//!
//! # Account API
//! GET  /api/account/admin-status         - Admin status of the session user
//! POST /api/account/admin-status/refresh - Re-verify admin status (requires auth)
//!
//! # Assistant API
//! POST /api/chat               - Ask the shopping assistant
//! ```

pub mod account;
pub mod api;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;
use tower_sessions::MemoryStore;

use crate::middleware::create_session_layer;
use crate::state::AppState;

/// Create the account routes router.
pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(account::index))
        .route("/settings", get(account::settings))
        .route("/tracking", get(account::tracking))
}

/// Create the JSON API routes router.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/account/admin-status", get(api::account::admin_status))
        .route(
            "/account/admin-status/refresh",
            post(api::account::refresh_admin_status),
        )
        .route("/chat", post(api::chat::chat))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .nest("/account", account_routes())
        .nest("/api", api_routes())
}

/// Build the application: all routes with the session and trace layers.
///
/// Sentry layers are added by the binary.
pub fn app(state: AppState, store: MemoryStore) -> Router {
    with_layers(routes(), state, store)
}

fn with_layers(router: Router<AppState>, state: AppState, store: MemoryStore) -> Router {
    let session_layer = create_session_layer(store, state.config());

    router
        .layer(session_layer)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running.
async fn health() -> &'static str {
    "ok"
}
