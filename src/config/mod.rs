//! Configuration module for C3.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{CounselorPrompts, Prompts};
pub use settings::{
    EmbeddingSettings, GeneralSettings, LlmSettings, PromptSettings, Provider, RagSettings,
    ServerSettings, Settings, VectorStoreProvider, VectorStoreSettings, CHROMA_API_KEY_ENV,
    CHROMA_URL_ENV,
};
