//! Shopping assistant backed by a chat completion API.
//!
//! One request per call: the conversation is sent with a system prompt
//! prepended and the first choice's text is returned. No retries, no
//! streaming.

use std::sync::Arc;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{instrument, warn};

use crate::config::OpenAIConfig;
use crate::models::ChatMessage;

const CHAT_COMPLETIONS_PATH: &str = "/v1/chat/completions";
const CHAT_MODEL: &str = "gpt-4o-mini";
const TEMPERATURE: f64 = 0.7;
const MAX_TOKENS: u32 = 1000;

const ASSISTANT_ROLE: &str = "You are a friendly shopping assistant for the Harbor online store.";
const ASSISTANT_SCOPE: &str = "Help with questions about products, orders, shipping and the shopper's account. Keep answers short, and say so when you do not know.";

/// Errors that can occur when asking the assistant.
#[derive(Debug, Error)]
pub enum ChatError {
    /// No API key is configured.
    #[error("chat assistant is not configured (OPENAI_API_KEY is unset)")]
    NotConfigured,

    /// The API key cannot be sent as a header.
    #[error("API key contains characters not allowed in a header")]
    InvalidApiKey,

    /// The API answered with a non-success status.
    #[error("chat completion request failed")]
    Upstream,

    /// HTTP transport failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The response body did not have the expected shape.
    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The response contained no choices.
    #[error("chat completion returned no choices")]
    EmptyResponse,
}

/// Chat completion client.
///
/// Built from the optional API configuration; when it is absent every call
/// fails with [`ChatError::NotConfigured`] without touching the network.
#[derive(Clone)]
pub struct ChatService {
    inner: Option<Arc<ChatServiceInner>>,
}

struct ChatServiceInner {
    client: reqwest::Client,
    endpoint: String,
}

impl ChatService {
    /// Create a chat service.
    ///
    /// # Errors
    ///
    /// Returns an error if the API key is not a valid header value or the
    /// HTTP client cannot be built.
    pub fn new(config: Option<&OpenAIConfig>) -> Result<Self, ChatError> {
        let Some(config) = config else {
            return Ok(Self::disabled());
        };

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let mut auth =
            HeaderValue::from_str(&format!("Bearer {}", config.api_key.expose_secret()))
                .map_err(|_| ChatError::InvalidApiKey)?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            inner: Some(Arc::new(ChatServiceInner {
                client,
                endpoint: format!("{}{CHAT_COMPLETIONS_PATH}", config.base_url),
            })),
        })
    }

    /// A service with no API key; every call fails fast.
    #[must_use]
    pub const fn disabled() -> Self {
        Self { inner: None }
    }

    /// Whether an API key is configured.
    #[must_use]
    pub const fn is_configured(&self) -> bool {
        self.inner.is_some()
    }

    /// Send `messages` with a system prompt for `context` and return the
    /// assistant's reply.
    ///
    /// # Errors
    ///
    /// - [`ChatError::NotConfigured`] before any I/O when no key is set
    /// - [`ChatError::Upstream`] on a non-success status
    /// - [`ChatError::Http`], [`ChatError::Parse`] or
    ///   [`ChatError::EmptyResponse`] when the exchange itself fails
    #[instrument(skip(self, messages), fields(message_count = messages.len()))]
    pub async fn chat_with_ai(
        &self,
        messages: &[ChatMessage],
        context: Option<&str>,
    ) -> Result<String, ChatError> {
        let inner = self.inner.as_ref().ok_or(ChatError::NotConfigured)?;

        let request = CompletionRequest {
            model: CHAT_MODEL,
            messages: with_system_prompt(messages, context),
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        };

        let response = inner
            .client
            .post(&inner.endpoint)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = %status, "Chat completion API returned non-success status");
            return Err(ChatError::Upstream);
        }

        let body = response.text().await?;
        let completion: CompletionResponse = serde_json::from_str(&body)?;

        completion
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or(ChatError::EmptyResponse)
    }
}

/// Build the system prompt, naming the page the shopper is on when known.
#[must_use]
pub fn system_prompt(context: Option<&str>) -> String {
    match context.filter(|c| !c.is_empty()) {
        Some(page) => {
            format!("{ASSISTANT_ROLE} The user is currently viewing: {page}. {ASSISTANT_SCOPE}")
        }
        None => format!("{ASSISTANT_ROLE} {ASSISTANT_SCOPE}"),
    }
}

fn with_system_prompt(messages: &[ChatMessage], context: Option<&str>) -> Vec<ChatMessage> {
    std::iter::once(ChatMessage::system(system_prompt(context)))
        .chain(messages.iter().cloned())
        .collect()
}

/// Request body for the chat completion API.
#[derive(Debug, Serialize)]
struct CompletionRequest {
    model: &'static str,
    messages: Vec<ChatMessage>,
    temperature: f64,
    max_tokens: u32,
}

/// Response from the chat completion API.
#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    content: String,
}
