//! Configuration settings for C3.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment variable holding the vector store base URL.
pub const CHROMA_URL_ENV: &str = "CHROMA_DB_URL";

/// Environment variable holding the optional vector store token.
pub const CHROMA_API_KEY_ENV: &str = "CHROMA_API_KEY";

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub llm: LlmSettings,
    pub embedding: EmbeddingSettings,
    pub vector_store: VectorStoreSettings,
    pub rag: RagSettings,
    pub server: ServerSettings,
    pub prompts: PromptSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Path to the career dataset used for seeding.
    pub dataset_path: String,
    /// Log level used when no `-v` flag is given (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            dataset_path: "data/careers.json".to_string(),
            log_level: "warn".to_string(),
        }
    }
}

/// Hosted AI provider.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// Google Generative AI (Gemini).
    #[default]
    Gemini,
    /// OpenAI-compatible API.
    #[serde(rename = "openai")]
    OpenAI,
}

impl Provider {
    /// Name of the environment variable holding this provider's API key.
    pub fn api_key_env(&self) -> &'static str {
        match self {
            Provider::Gemini => "GOOGLE_GENERATIVE_AI_API_KEY",
            Provider::OpenAI => "OPENAI_API_KEY",
        }
    }

    /// Read the API key from the environment. Empty values count as missing.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(self.api_key_env())
            .ok()
            .filter(|key| !key.trim().is_empty())
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Provider::Gemini => write!(f, "gemini"),
            Provider::OpenAI => write!(f, "openai"),
        }
    }
}

/// Chat completion settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    /// Completion provider (gemini, openai).
    pub provider: Provider,
    /// Model used for chat completions.
    pub model: String,
    /// Override for the provider base URL.
    pub base_url: Option<String>,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            provider: Provider::Gemini,
            model: "gemini-1.5-flash-latest".to_string(),
            base_url: None,
        }
    }
}

/// Embedding generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    /// Embedding provider (gemini, openai).
    pub provider: Provider,
    /// Embedding model to use.
    pub model: String,
    /// Embedding dimensions.
    pub dimensions: u32,
    /// Override for the provider base URL.
    pub base_url: Option<String>,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: Provider::Gemini,
            model: "text-embedding-004".to_string(),
            dimensions: 768,
            base_url: None,
        }
    }
}

/// Vector store backend.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum VectorStoreProvider {
    /// Chroma over its REST API.
    #[default]
    Chroma,
    /// Process-local store, lost on exit.
    Memory,
}

/// Vector store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorStoreSettings {
    /// Vector store provider (chroma, memory).
    pub provider: VectorStoreProvider,
    /// Base URL of the Chroma server.
    pub url: String,
    /// Collection holding the career knowledge base.
    pub collection: String,
    /// Chroma tenant.
    pub tenant: String,
    /// Chroma database.
    pub database: String,
}

impl Default for VectorStoreSettings {
    fn default() -> Self {
        Self {
            provider: VectorStoreProvider::Chroma,
            url: "http://localhost:8000".to_string(),
            collection: "career_c3_knowledge_base".to_string(),
            tenant: "default_tenant".to_string(),
            database: "default_database".to_string(),
        }
    }
}

/// RAG (Retrieval-Augmented Generation) settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RagSettings {
    /// Inject retrieved career records into the system prompt.
    pub enabled: bool,
    /// Number of nearest documents to include.
    pub top_k: usize,
}

impl Default for RagSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            top_k: 2,
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: std::collections::HashMap<String, String>,
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    ///
    /// Environment overrides are applied after the file is read.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        let mut settings = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content)?
        } else {
            Settings::default()
        };

        settings.apply_env();
        Ok(settings)
    }

    /// Apply environment variable overrides.
    pub fn apply_env(&mut self) {
        if let Ok(url) = std::env::var(CHROMA_URL_ENV) {
            if !url.trim().is_empty() {
                self.vector_store.url = url;
            }
        }
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::C3Error::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("c3")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded dataset path.
    pub fn dataset_path(&self) -> PathBuf {
        Self::expand_path(&self.general.dataset_path)
    }

    /// Optional token for hosted Chroma deployments.
    pub fn chroma_api_key(&self) -> Option<String> {
        std::env::var(CHROMA_API_KEY_ENV)
            .ok()
            .filter(|key| !key.trim().is_empty())
    }
}
