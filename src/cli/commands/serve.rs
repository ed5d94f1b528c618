//! HTTP chat server.
//!
//! Exposes the streaming chat endpoint consumed by the web UI.

use crate::cli::Output;
use crate::config::Settings;
use crate::data_stream::{self, STREAM_HEADER, STREAM_VERSION};
use crate::error::C3Error;
use crate::llm::ChatMessage;
use crate::rag::{self, ChatEngine};
use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

/// Shared application state.
struct AppState {
    engine: ChatEngine,
}

/// Build the HTTP router around a chat engine.
pub fn router(engine: ChatEngine) -> Router {
    let state = Arc::new(AppState { engine });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/api/chat", post(chat))
        .layer(cors)
        .with_state(state)
}

/// Run the HTTP API server.
pub async fn run_serve(
    host: Option<String>,
    port: Option<u16>,
    settings: Settings,
) -> anyhow::Result<()> {
    let engine = rag::engine_from_settings(&settings)?;
    let uses_retrieval = engine.uses_retrieval();

    let host = host.unwrap_or_else(|| settings.server.host.clone());
    let port = port.unwrap_or(settings.server.port);
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("C3 Chat Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    Output::kv("Model", &format!("{} ({})", settings.llm.model, settings.llm.provider));
    Output::kv(
        "Retrieval",
        if uses_retrieval {
            settings.vector_store.collection.as_str()
        } else {
            "disabled"
        },
    );
    println!();
    println!("Endpoints:");
    Output::kv("Health", "GET  /health");
    Output::kv("Chat", "POST /api/chat");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    info!("Serving on {}", addr);
    axum::serve(listener, router(engine)).await?;

    Ok(())
}

// === Request/Response Types ===

#[derive(Deserialize)]
struct ChatRequest {
    messages: Vec<ChatMessage>,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

fn error_response(status: StatusCode, message: String) -> Response {
    (status, Json(ErrorResponse { error: message })).into_response()
}

// === Handlers ===

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn chat(State(state): State<Arc<AppState>>, Json(req): Json<ChatRequest>) -> Response {
    match state.engine.stream_reply(&req.messages).await {
        Ok(stream) => {
            let body = Body::from_stream(data_stream::encode(stream).map(Ok::<_, Infallible>));
            (
                [
                    (
                        header::CONTENT_TYPE,
                        HeaderValue::from_static("text/plain; charset=utf-8"),
                    ),
                    (
                        HeaderName::from_static(STREAM_HEADER),
                        HeaderValue::from_static(STREAM_VERSION),
                    ),
                ],
                body,
            )
                .into_response()
        }
        Err(C3Error::InvalidInput(msg)) => error_response(StatusCode::BAD_REQUEST, msg),
        Err(e) => {
            error!("Failed to start completion: {}", e);
            error_response(StatusCode::BAD_GATEWAY, e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::llm::{ChatModel, TextStream};
    use crate::rag::Retriever;
    use crate::vector_store::{MemoryVectorStore, VectorStore};
    use async_trait::async_trait;
    use axum::http::{Method, Request};
    use std::sync::Mutex;
    use tower::ServiceExt;

    #[derive(Default)]
    struct ScriptedModel {
        system: Mutex<Option<String>>,
        fail_open: bool,
    }

    #[async_trait]
    impl ChatModel for ScriptedModel {
        async fn stream(&self, system: &str, _messages: &[ChatMessage]) -> Result<TextStream> {
            if self.fail_open {
                return Err(C3Error::Chat("Gemini API error 503".to_string()));
            }
            *self.system.lock().unwrap() = Some(system.to_string());
            let chunks: Vec<Result<String>> =
                vec![Ok("Hello".to_string()), Ok(", student".to_string())];
            Ok(futures::stream::iter(chunks).boxed())
        }

        fn model(&self) -> &str {
            "scripted"
        }
    }

    fn chat_request(body: &str) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri("/api/chat")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_string(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let app = router(ChatEngine::new(Arc::new(ScriptedModel::default())));
        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, r#"{"status":"ok"}"#);
    }

    #[tokio::test]
    async fn test_chat_streams_data_stream_parts() {
        let app = router(ChatEngine::new(Arc::new(ScriptedModel::default())));
        let response = app
            .oneshot(chat_request(
                r#"{"messages":[{"role":"user","content":"I completed 12th in Commerce"}]}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[STREAM_HEADER], "v1");
        assert_eq!(
            body_string(response).await,
            "0:\"Hello\"\n0:\", student\"\nd:{\"finishReason\":\"stop\"}\n"
        );
    }

    #[tokio::test]
    async fn test_chat_without_context_uses_fallback_phrase() {
        let model = Arc::new(ScriptedModel::default());
        let store: Arc<dyn VectorStore> = Arc::new(MemoryVectorStore::new());
        let engine = ChatEngine::new(model.clone()).with_retriever(Retriever::new(None, store, 2));
        let app = router(engine);

        let response = app
            .oneshot(chat_request(
                r#"{"messages":[{"role":"user","content":"Which exams for law?"}]}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        body_string(response).await;

        let system = model.system.lock().unwrap().clone().unwrap();
        assert!(system.contains("No specific database information found"));
    }

    #[tokio::test]
    async fn test_empty_messages_are_rejected() {
        let app = router(ChatEngine::new(Arc::new(ScriptedModel::default())));
        let response = app.oneshot(chat_request(r#"{"messages":[]}"#)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_malformed_body_is_rejected() {
        let app = router(ChatEngine::new(Arc::new(ScriptedModel::default())));
        let response = app
            .oneshot(chat_request(r#"{"messages":[{"role":"robot","content":"x"}]}"#))
            .await
            .unwrap();
        assert!(response.status().is_client_error());
    }

    #[tokio::test]
    async fn test_upstream_failure_is_bad_gateway() {
        let model = ScriptedModel {
            fail_open: true,
            ..Default::default()
        };
        let app = router(ChatEngine::new(Arc::new(model)));
        let response = app
            .oneshot(chat_request(r#"{"messages":[{"role":"user","content":"hi"}]}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert!(body_string(response).await.contains("503"));
    }
}
