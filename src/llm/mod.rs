//! Streaming chat completion providers.

mod gemini;
mod openai;
pub mod sse;

pub use gemini::GeminiChatModel;
pub use openai::OpenAIChatModel;

use crate::config::{LlmSettings, Provider};
use crate::error::{C3Error, Result};
use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Author of a chat message.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    /// Gemini calls this role `model`; both spellings are accepted.
    #[serde(alias = "model")]
    Assistant,
}

/// A single conversation turn.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    /// A user turn with a fresh ID.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            id: Some(uuid::Uuid::new_v4().to_string()),
            role: Role::User,
            content: content.into(),
        }
    }

    /// An assistant turn with a fresh ID.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            id: Some(uuid::Uuid::new_v4().to_string()),
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Incremental text chunks of a completion.
pub type TextStream = BoxStream<'static, Result<String>>;

/// Trait for streaming chat completion.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Open a completion stream for the conversation under `system`.
    ///
    /// Errors returned here mean the stream could not be opened; errors
    /// inside the stream mean it broke off midway.
    async fn stream(&self, system: &str, messages: &[ChatMessage]) -> Result<TextStream>;

    /// Model identifier, for logging.
    fn model(&self) -> &str;
}

/// Build the configured chat model.
///
/// Fails with a configuration error when the provider's API key is not set.
pub fn from_settings(settings: &LlmSettings) -> Result<Arc<dyn ChatModel>> {
    let api_key = settings.provider.api_key().ok_or_else(|| {
        C3Error::Config(format!(
            "{} not set. Export it before starting the chat.",
            settings.provider.api_key_env()
        ))
    })?;

    let model: Arc<dyn ChatModel> = match settings.provider {
        Provider::Gemini => {
            let mut model = GeminiChatModel::new(&api_key, &settings.model)?;
            if let Some(base) = &settings.base_url {
                model = model.with_base_url(base);
            }
            Arc::new(model)
        }
        Provider::OpenAI => Arc::new(OpenAIChatModel::new(
            &settings.model,
            settings.base_url.as_deref(),
        )?),
    };

    Ok(model)
}
