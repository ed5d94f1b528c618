//! RAG (Retrieval-Augmented Generation) for career counseling replies.
//!
//! Retrieval looks up career records near the student's last message and
//! the engine folds them into the counselor system prompt.

pub mod context;
mod response;

pub use context::{join_documents, Retriever, CONTEXT_SEPARATOR};
pub use response::{compose_system_prompt, ChatEngine};

use crate::config::{Prompts, Settings};
use crate::error::Result;
use crate::llm;
use crate::vector_store;

/// Wire a [`ChatEngine`] from settings: chat model, prompts and, when
/// enabled, retrieval against the configured vector store.
pub fn engine_from_settings(settings: &Settings) -> Result<ChatEngine> {
    let model = llm::from_settings(&settings.llm)?;
    let prompts = Prompts::load(
        settings.prompts.custom_dir.as_deref(),
        Some(&settings.prompts.variables),
    )?;

    let mut engine = ChatEngine::new(model).with_prompts(prompts);
    if settings.rag.enabled {
        let store = vector_store::from_settings(settings)?;
        engine = engine.with_retriever(Retriever::from_settings(settings, store)?);
    }

    Ok(engine)
}
