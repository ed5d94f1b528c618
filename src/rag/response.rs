//! Prompt composition and streamed replies.

use super::Retriever;
use crate::config::Prompts;
use crate::error::{C3Error, Result};
use crate::llm::{ChatMessage, ChatModel, Role, TextStream};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Answers conversations with the counselor prompt, optionally grounded in retrieved records.
pub struct ChatEngine {
    model: Arc<dyn ChatModel>,
    retriever: Option<Retriever>,
    prompts: Prompts,
}

impl ChatEngine {
    /// Create an engine that always uses the static system prompt.
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self {
            model,
            retriever: None,
            prompts: Prompts::default(),
        }
    }

    /// Ground replies in context from `retriever`.
    pub fn with_retriever(mut self, retriever: Retriever) -> Self {
        self.retriever = Some(retriever);
        self
    }

    /// Set custom prompts (with user-defined variables).
    pub fn with_prompts(mut self, prompts: Prompts) -> Self {
        self.prompts = prompts;
        self
    }

    /// Whether retrieval is wired in.
    pub fn uses_retrieval(&self) -> bool {
        self.retriever.is_some()
    }

    /// System prompt for the conversation.
    ///
    /// With retrieval enabled the last user message is the query.
    pub async fn system_prompt(&self, messages: &[ChatMessage]) -> String {
        let Some(retriever) = &self.retriever else {
            return compose_system_prompt(&self.prompts, None);
        };

        let query = last_user_message(messages).unwrap_or_default();
        let context = if query.trim().is_empty() {
            String::new()
        } else {
            retriever.retrieve_context(query).await
        };

        compose_system_prompt(&self.prompts, Some(&context))
    }

    /// Open a reply stream for the conversation.
    #[instrument(skip(self, messages), fields(turns = messages.len(), model = %self.model.model()))]
    pub async fn stream_reply(&self, messages: &[ChatMessage]) -> Result<TextStream> {
        if messages.is_empty() {
            return Err(C3Error::InvalidInput("messages must not be empty".to_string()));
        }

        let system = self.system_prompt(messages).await;
        debug!("System prompt is {} bytes", system.len());
        info!("Forwarding {} messages to {}", messages.len(), self.model.model());

        self.model.stream(&system, messages).await
    }
}

/// Content of the most recent user turn.
fn last_user_message(messages: &[ChatMessage]) -> Option<&str> {
    messages
        .iter()
        .rev()
        .find(|m| m.role == Role::User)
        .map(|m| m.content.as_str())
}

/// Build the system prompt.
///
/// `context` is `None` when retrieval is disabled, and `Some("")` when it ran
/// but found nothing.
pub fn compose_system_prompt(prompts: &Prompts, context: Option<&str>) -> String {
    let mut vars = HashMap::new();
    let system = prompts.render_with_custom(&prompts.counselor.system, &vars);

    let section = match context {
        None => return system,
        Some(ctx) if ctx.trim().is_empty() => {
            prompts.render_with_custom(&prompts.counselor.no_context, &vars)
        }
        Some(ctx) => {
            vars.insert("context".to_string(), ctx.to_string());
            prompts.render_with_custom(&prompts.counselor.context, &vars)
        }
    };

    format!("{}\n\n{}", system, section)
}
