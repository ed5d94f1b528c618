//! OpenAI client configuration.

use crate::error::Result;
use crate::http::shared_client;
use async_openai::{config::OpenAIConfig, Client};

/// Create an OpenAI client on top of the shared HTTP client.
///
/// The API key is read from `OPENAI_API_KEY`. `base_url` points the client at
/// any OpenAI-compatible endpoint.
pub fn create_client(base_url: Option<&str>) -> Result<Client<OpenAIConfig>> {
    let mut config = OpenAIConfig::default();
    if let Some(base) = base_url {
        config = config.with_api_base(base);
    }

    Ok(Client::with_config(config).with_http_client(shared_client()?))
}
