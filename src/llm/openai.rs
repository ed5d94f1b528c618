//! OpenAI streaming chat completion.

use super::{ChatMessage, ChatModel, Role, TextStream};
use crate::error::{C3Error, Result};
use crate::openai::create_client;
use async_openai::types::{
    ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequestArgs,
};
use async_trait::async_trait;
use futures::StreamExt;
use tracing::{debug, instrument};

/// OpenAI-compatible chat model.
pub struct OpenAIChatModel {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
}

impl OpenAIChatModel {
    /// Create a chat model. The API key is read from `OPENAI_API_KEY`.
    pub fn new(model: &str, base_url: Option<&str>) -> Result<Self> {
        Ok(Self {
            client: create_client(base_url)?,
            model: model.to_string(),
        })
    }

    fn build_messages(
        system: &str,
        messages: &[ChatMessage],
    ) -> Result<Vec<ChatCompletionRequestMessage>> {
        let mut out: Vec<ChatCompletionRequestMessage> = Vec::with_capacity(messages.len() + 1);
        out.push(
            ChatCompletionRequestSystemMessageArgs::default()
                .content(system)
                .build()
                .map_err(|e| C3Error::Chat(e.to_string()))?
                .into(),
        );

        for message in messages {
            let converted: ChatCompletionRequestMessage = match message.role {
                Role::User => ChatCompletionRequestUserMessageArgs::default()
                    .content(message.content.as_str())
                    .build()
                    .map_err(|e| C3Error::Chat(e.to_string()))?
                    .into(),
                Role::Assistant => ChatCompletionRequestAssistantMessageArgs::default()
                    .content(message.content.as_str())
                    .build()
                    .map_err(|e| C3Error::Chat(e.to_string()))?
                    .into(),
            };
            out.push(converted);
        }

        Ok(out)
    }
}

#[async_trait]
impl ChatModel for OpenAIChatModel {
    #[instrument(skip(self, system, messages), fields(model = %self.model, turns = messages.len()))]
    async fn stream(&self, system: &str, messages: &[ChatMessage]) -> Result<TextStream> {
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(Self::build_messages(system, messages)?)
            .build()
            .map_err(|e| C3Error::Chat(e.to_string()))?;

        let stream = self
            .client
            .chat()
            .create_stream(request)
            .await
            .map_err(|e| C3Error::OpenAI(format!("Failed to open stream: {}", e)))?;

        debug!("OpenAI stream opened");

        let text = stream.filter_map(|item| async move {
            match item {
                Ok(response) => {
                    let chunk: String = response
                        .choices
                        .into_iter()
                        .filter_map(|c| c.delta.content)
                        .collect();
                    (!chunk.is_empty()).then_some(Ok(chunk))
                }
                Err(e) => Some(Err(C3Error::OpenAI(format!("Stream interrupted: {}", e)))),
            }
        });

        Ok(text.boxed())
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    fn chunk(content: Option<&str>, finish_reason: Option<&str>) -> String {
        let delta = match content {
            Some(text) => json!({ "role": "assistant", "content": text }),
            None => json!({}),
        };
        let event = json!({
            "id": "chatcmpl-1",
            "object": "chat.completion.chunk",
            "created": 1_700_000_000,
            "model": "gpt-4o-mini",
            "choices": [{ "index": 0, "delta": delta, "finish_reason": finish_reason }]
        });
        format!("data: {}\n\n", event)
    }

    #[test]
    fn test_build_messages_prepends_system() {
        let history = vec![
            ChatMessage::user("I like biology"),
            ChatMessage::assistant("Have you considered NEET?"),
        ];
        let messages = OpenAIChatModel::build_messages("counselor", &history).unwrap();

        assert_eq!(messages.len(), 3);
        assert!(matches!(messages[0], ChatCompletionRequestMessage::System(_)));
        assert!(matches!(messages[1], ChatCompletionRequestMessage::User(_)));
        assert!(matches!(messages[2], ChatCompletionRequestMessage::Assistant(_)));
    }

    #[tokio::test]
    async fn test_stream_yields_delta_content() {
        let mut server = mockito::Server::new_async().await;
        let body = format!(
            "{}{}{}data: [DONE]\n\n",
            chunk(Some("Hello"), None),
            chunk(Some(", student"), None),
            chunk(None, Some("stop"))
        );
        let mock = server
            .mock("POST", "/chat/completions")
            .match_body(Matcher::PartialJson(json!({
                "model": "gpt-4o-mini",
                "stream": true
            })))
            .with_status(200)
            .with_header("content-type", "text/event-stream")
            .with_body(body)
            .create_async()
            .await;

        let model = OpenAIChatModel::new("gpt-4o-mini", Some(&server.url())).unwrap();
        let stream = model
            .stream("counselor", &[ChatMessage::user("What after 10th?")])
            .await
            .unwrap();
        let chunks: Vec<String> = stream.map(|r| r.unwrap()).collect().await;

        assert_eq!(chunks, vec!["Hello", ", student"]);
        mock.assert_async().await;
    }
}
