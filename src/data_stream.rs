//! AI SDK data stream protocol framing.
//!
//! Each part is one line: a type code, a colon, a JSON value and `\n`.
//! Chat UIs built on the AI SDK `useChat` hook consume this format directly.

use crate::llm::TextStream;
use futures::{Stream, StreamExt};
use serde_json::json;
use tracing::warn;

/// Response header announcing the protocol version.
pub const STREAM_HEADER: &str = "x-vercel-ai-data-stream";
pub const STREAM_VERSION: &str = "v1";

/// Why the stream ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    Stop,
    Error,
}

impl FinishReason {
    fn as_str(&self) -> &'static str {
        match self {
            FinishReason::Stop => "stop",
            FinishReason::Error => "error",
        }
    }
}

/// `0:` text part.
pub fn text_part(text: &str) -> String {
    format!("0:{}\n", json!(text))
}

/// `3:` error part.
pub fn error_part(message: &str) -> String {
    format!("3:{}\n", json!(message))
}

/// `d:` finish part, always the last line.
pub fn finish_part(reason: FinishReason) -> String {
    format!("d:{}\n", json!({ "finishReason": reason.as_str() }))
}

/// Frame a completion stream as data stream lines.
///
/// A clean end appends a stop finish part. An upstream error becomes an
/// error part plus an error finish part, and nothing after it is forwarded.
pub fn encode(stream: TextStream) -> impl Stream<Item = String> + Send {
    futures::stream::unfold(Some(stream), |state| async move {
        let mut stream = state?;
        let frame = match stream.next().await {
            Some(Ok(text)) => return Some((text_part(&text), Some(stream))),
            Some(Err(e)) => {
                warn!("Completion stream failed: {}", e);
                format!(
                    "{}{}",
                    error_part(&e.to_string()),
                    finish_part(FinishReason::Error)
                )
            }
            None => finish_part(FinishReason::Stop),
        };
        Some((frame, None))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{C3Error, Result};

    #[test]
    fn test_parts_are_json_encoded() {
        assert_eq!(text_part("Hello"), "0:\"Hello\"\n");
        assert_eq!(text_part("line\n\"quoted\""), "0:\"line\\n\\\"quoted\\\"\"\n");
        assert_eq!(error_part("boom"), "3:\"boom\"\n");
        assert_eq!(finish_part(FinishReason::Stop), "d:{\"finishReason\":\"stop\"}\n");
    }

    #[tokio::test]
    async fn test_clean_stream_ends_with_stop() {
        let chunks: Vec<Result<String>> = vec![Ok("Namaste".to_string()), Ok("!".to_string())];
        let lines: Vec<String> = encode(futures::stream::iter(chunks).boxed()).collect().await;

        assert_eq!(
            lines,
            vec![
                "0:\"Namaste\"\n".to_string(),
                "0:\"!\"\n".to_string(),
                "d:{\"finishReason\":\"stop\"}\n".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_error_stops_forwarding() {
        let chunks: Vec<Result<String>> = vec![
            Ok("Part".to_string()),
            Err(C3Error::Chat("reset by peer".to_string())),
            Ok("never sent".to_string()),
        ];
        let body: String = encode(futures::stream::iter(chunks).boxed())
            .collect::<Vec<_>>()
            .await
            .concat();

        assert!(body.starts_with("0:\"Part\"\n3:"));
        assert!(body.contains("reset by peer"));
        assert!(body.ends_with("d:{\"finishReason\":\"error\"}\n"));
        assert!(!body.contains("never sent"));
    }
}
