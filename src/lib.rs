//! C3 - Career Clarity Chatbot
//!
//! An AI career counselor for Indian students that grounds its answers in a
//! small knowledge base of career paths, entrance exams and colleges.
//!
//! # Overview
//!
//! C3 allows you to:
//! - Seed a vector store with embedded career records
//! - Serve a streaming chat endpoint for the web UI
//! - Chat with the counselor directly from the terminal
//!
//! # Architecture
//!
//! - `careers` - Career dataset and document text
//! - `config` - Settings and counselor prompts
//! - `embedding` - Embedding generation
//! - `vector_store` - Vector database abstraction
//! - `llm` - Streaming chat completion providers
//! - `rag` - Context retrieval and response generation
//! - `seeder` - Knowledge base seeding
//! - `data_stream` - Wire framing for streamed replies
//!
//! # Example
//!
//! ```rust,no_run
//! use c3::config::Settings;
//! use c3::llm::ChatMessage;
//! use futures::StreamExt;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let engine = c3::rag::engine_from_settings(&settings)?;
//!
//!     let messages = vec![ChatMessage::user("I finished 12th with PCM. What next?")];
//!     let mut reply = engine.stream_reply(&messages).await?;
//!     while let Some(chunk) = reply.next().await {
//!         print!("{}", chunk?);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod careers;
pub mod cli;
pub mod config;
pub mod data_stream;
pub mod embedding;
pub mod error;
pub mod http;
pub mod llm;
pub mod openai;
pub mod rag;
pub mod seeder;
pub mod vector_store;

pub use error::{C3Error, Result};
