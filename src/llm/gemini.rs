//! Gemini streaming chat completion.

use super::sse::SseDecoder;
use super::{ChatMessage, ChatModel, Role, TextStream};
use crate::embedding::GEMINI_BASE_URL;
use crate::error::{C3Error, Result};
use crate::http::shared_client;
use async_trait::async_trait;
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::pin::Pin;
use tracing::{debug, instrument};

/// Gemini chat model using `streamGenerateContent` with SSE framing.
pub struct GeminiChatModel {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

#[derive(Serialize, Deserialize, Debug, Default)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Serialize, Deserialize, Debug, Default)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    system_instruction: Content,
    contents: Vec<Content>,
}

#[derive(Deserialize, Debug)]
struct Candidate {
    #[serde(default)]
    content: Content,
}

#[derive(Deserialize, Debug)]
struct ApiError {
    #[serde(default)]
    message: String,
}

#[derive(Deserialize, Debug)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    error: Option<ApiError>,
}

impl GeminiChatModel {
    /// Create a chat model (e.g. `gemini-1.5-flash-latest`).
    pub fn new(api_key: &str, model: &str) -> Result<Self> {
        Ok(Self {
            client: shared_client()?,
            api_key: api_key.to_string(),
            base_url: GEMINI_BASE_URL.to_string(),
            model: model.strip_prefix("models/").unwrap_or(model).to_string(),
        })
    }

    /// Point the model at a different endpoint.
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    fn build_request(system: &str, messages: &[ChatMessage]) -> GenerateContentRequest {
        let contents = messages
            .iter()
            .map(|m| Content {
                role: Some(
                    match m.role {
                        Role::User => "user",
                        Role::Assistant => "model",
                    }
                    .to_string(),
                ),
                parts: vec![Part {
                    text: m.content.clone(),
                }],
            })
            .collect();

        GenerateContentRequest {
            system_instruction: Content {
                role: None,
                parts: vec![Part {
                    text: system.to_string(),
                }],
            },
            contents,
        }
    }
}

/// Extract the text of one streamed response event. `None` for events without text.
fn parse_event(data: &str) -> Result<Option<String>> {
    let response: GenerateContentResponse = serde_json::from_str(data)
        .map_err(|e| C3Error::Chat(format!("Malformed stream event: {}", e)))?;

    if let Some(error) = response.error {
        return Err(C3Error::Chat(format!("Gemini API error: {}", error.message)));
    }

    let text: String = response
        .candidates
        .into_iter()
        .next()
        .map(|c| c.content.parts.into_iter().map(|p| p.text).collect())
        .unwrap_or_default();

    Ok(if text.is_empty() { None } else { Some(text) })
}

/// Turn a raw SSE byte stream into text chunks.
fn decode_stream<S, B>(bytes: S) -> impl Stream<Item = Result<String>>
where
    S: Stream<Item = std::result::Result<B, reqwest::Error>> + Send + 'static,
    B: AsRef<[u8]> + Send,
{
    struct State<S> {
        bytes: Pin<Box<S>>,
        decoder: SseDecoder,
        pending: VecDeque<Result<String>>,
        done: bool,
    }

    fn push_events(pending: &mut VecDeque<Result<String>>, events: Vec<String>) {
        for event in events {
            if let Some(item) = parse_event(&event).transpose() {
                pending.push_back(item);
            }
        }
    }

    let state = State {
        bytes: Box::pin(bytes),
        decoder: SseDecoder::new(),
        pending: VecDeque::new(),
        done: false,
    };

    futures::stream::unfold(state, |mut state| async move {
        loop {
            if let Some(item) = state.pending.pop_front() {
                return Some((item, state));
            }
            if state.done {
                return None;
            }

            match state.bytes.next().await {
                Some(Ok(chunk)) => {
                    let events = state.decoder.feed(chunk.as_ref());
                    push_events(&mut state.pending, events);
                }
                Some(Err(e)) => {
                    state
                        .pending
                        .push_back(Err(C3Error::Chat(format!("Stream interrupted: {}", e))));
                    state.done = true;
                }
                None => {
                    let tail = state.decoder.finish().into_iter().collect();
                    push_events(&mut state.pending, tail);
                    state.done = true;
                }
            }
        }
    })
}

#[async_trait]
impl ChatModel for GeminiChatModel {
    #[instrument(skip(self, system, messages), fields(model = %self.model, turns = messages.len()))]
    async fn stream(&self, system: &str, messages: &[ChatMessage]) -> Result<TextStream> {
        let url = format!(
            "{}/v1beta/models/{}:streamGenerateContent",
            self.base_url, self.model
        );

        let response = self
            .client
            .post(url)
            .query(&[("alt", "sse")])
            .header("x-goog-api-key", &self.api_key)
            .json(&Self::build_request(system, messages))
            .send()
            .await
            .map_err(|e| C3Error::Chat(format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(C3Error::Chat(format!(
                "Gemini API error {}: {}",
                status, error_text
            )));
        }

        debug!("Gemini stream opened");
        Ok(decode_stream(response.bytes_stream()).boxed())
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

    #[test]
    fn test_request_maps_roles_and_system() {
        let messages = vec![
            ChatMessage::user("Hi"),
            ChatMessage::assistant("Hello! Which grade?"),
        ];
        let request = GeminiChatModel::build_request("be kind", &messages);
        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(value["systemInstruction"]["parts"][0]["text"], "be kind");
        assert!(value["systemInstruction"].get("role").is_none());
        assert_eq!(value["contents"][0]["role"], "user");
        assert_eq!(value["contents"][1]["role"], "model");
        assert_eq!(value["contents"][1]["parts"][0]["text"], "Hello! Which grade?");
    }

    #[test]
    fn test_parse_event() {
        let data = json!({
            "candidates": [{ "content": { "role": "model", "parts": [{ "text": "Hello" }, { "text": " there" }] } }]
        })
        .to_string();
        assert_eq!(parse_event(&data).unwrap(), Some("Hello there".to_string()));

        let finish_only = json!({ "candidates": [{ "finishReason": "STOP" }] }).to_string();
        assert_eq!(parse_event(&finish_only).unwrap(), None);

        let error = json!({ "error": { "code": 429, "message": "quota" } }).to_string();
        assert!(parse_event(&error).is_err());
    }

    #[tokio::test]
    async fn test_decode_stream_handles_split_chunks() {
        let event = |t: &str| {
            format!(
                "data: {}\r\n\r\n",
                json!({ "candidates": [{ "content": { "parts": [{ "text": t }] } }] })
            )
        };
        let body = format!("{}{}", event("Engineering"), event(" is great"));
        let (a, b) = body.as_bytes().split_at(17);
        let chunks: Vec<std::result::Result<Vec<u8>, reqwest::Error>> =
            vec![Ok(a.to_vec()), Ok(b.to_vec())];

        let texts: Vec<String> = decode_stream(futures::stream::iter(chunks))
            .map(|r| r.unwrap())
            .collect()
            .await;
        assert_eq!(texts, vec!["Engineering".to_string(), " is great".to_string()]);
    }

    #[tokio::test]
    async fn test_stream_against_mock_server() {
        let mut server = mockito::Server::new_async().await;
        let body = format!(
            "data: {}\r\n\r\ndata: {}\r\n\r\n",
            json!({ "candidates": [{ "content": { "parts": [{ "text": "Namaste" }] } }] }),
            json!({ "candidates": [{ "content": { "parts": [{ "text": "!" }] }, "finishReason": "STOP" }] }),
        );
        let mock = server
            .mock("POST", "/v1beta/models/gemini-1.5-flash-latest:streamGenerateContent")
            .match_query(Matcher::UrlEncoded("alt".into(), "sse".into()))
            .match_header("x-goog-api-key", "test-key")
            .with_status(200)
            .with_header("content-type", "text/event-stream")
            .with_body(body)
            .create_async()
            .await;

        let model = GeminiChatModel::new("test-key", "models/gemini-1.5-flash-latest")
            .unwrap()
            .with_base_url(&server.url());
        let stream = model
            .stream("system", &[ChatMessage::user("hello")])
            .await
            .unwrap();
        let text: Vec<String> = stream.map(|r| r.unwrap()).collect().await;

        mock.assert_async().await;
        assert_eq!(text.concat(), "Namaste!");
    }

    #[tokio::test]
    async fn test_open_failure_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", Matcher::Any)
            .with_status(500)
            .with_body("boom")
            .create_async()
            .await;

        let model = GeminiChatModel::new("k", "gemini-1.5-flash-latest")
            .unwrap()
            .with_base_url(&server.url());
        let result = model.stream("s", &[ChatMessage::user("x")]).await;
        assert!(matches!(result, Err(C3Error::Chat(_))));
    }
}
