//! Account API routes.

use axum::{Json, extract::State};
use tower_sessions::Session;
use tracing::instrument;

use crate::error::Result;
use crate::middleware::auth::RequireAuth;
use crate::models::AdminStatus;
use crate::routes::account::resolve_admin_status;
use crate::services::auth::ADMIN_STATUS_QUERY;
use crate::services::query::QueryKey;
use crate::state::AppState;

/// Admin status of the session's user.
///
/// Guests are never admins; the response is `{"is_admin": false,
/// "is_checking": false}` for them.
#[instrument(skip_all)]
pub async fn admin_status(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<AdminStatus>> {
    let status = resolve_admin_status(&state, &session).await?;
    Ok(Json(status))
}

/// Drop the cached verification for the signed-in user and check again.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn refresh_admin_status(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
) -> Result<Json<AdminStatus>> {
    let key = QueryKey::new(ADMIN_STATUS_QUERY).with(&user.id);
    state.admin_queries().invalidate(&key).await;
    tracing::debug!(key = %key, "Admin status invalidated");

    let status = resolve_admin_status(&state, &session).await?;
    Ok(Json(status))
}
