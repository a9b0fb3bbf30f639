//! Shopping assistant API.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::{AppError, Result, set_sentry_user};
use crate::middleware::auth::OptionalAuth;
use crate::models::{ChatMessage, ChatRole};
use crate::services::chat::ChatError;
use crate::state::AppState;

/// Request body for `POST /api/chat`.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    /// Conversation so far, oldest first.
    pub messages: Vec<ChatMessage>,
    /// Name of the page the shopper is looking at.
    #[serde(default)]
    pub context: Option<String>,
}

/// Response body for `POST /api/chat`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatReply {
    pub reply: String,
}

/// Ask the shopping assistant.
#[instrument(skip_all, fields(message_count = request.messages.len()))]
pub async fn chat(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatReply>> {
    if let Some(user) = &user {
        set_sentry_user(&user.id, Some(user.email.as_str()));
    }

    if !state.chat().is_configured() {
        return Err(ChatError::NotConfigured.into());
    }
    if request.messages.is_empty() {
        return Err(AppError::BadRequest("conversation is empty".to_string()));
    }
    // The system prompt is ours to write.
    if request.messages.iter().any(|m| m.role == ChatRole::System) {
        return Err(AppError::BadRequest(
            "system messages are not accepted".to_string(),
        ));
    }

    let reply = state
        .chat()
        .chat_with_ai(&request.messages, request.context.as_deref())
        .await?;

    Ok(Json(ChatReply { reply }))
}
