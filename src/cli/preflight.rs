//! Pre-flight checks before operations that call external services.
//!
//! Validates that required configuration is available before starting
//! operations that would otherwise fail midway.

use crate::config::Settings;
use crate::error::{C3Error, Result};

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Seeding needs the embedding key and the dataset file.
    Seed,
    /// Chatting needs the completion key. Retrieval degrades without its key.
    Chat,
    /// Search needs the embedding key.
    Search,
}

/// Run pre-flight checks for the given operation.
///
/// Returns Ok(()) if all checks pass, or an error describing what's missing.
pub fn check(operation: Operation, settings: &Settings) -> Result<()> {
    match operation {
        Operation::Seed => {
            check_api_key(settings.embedding.provider.api_key_env())?;
            check_dataset(settings)?;
        }
        Operation::Chat => {
            check_api_key(settings.llm.provider.api_key_env())?;
        }
        Operation::Search => {
            check_api_key(settings.embedding.provider.api_key_env())?;
        }
    }
    Ok(())
}

/// Check if an API key variable is set and non-empty.
fn check_api_key(var: &str) -> Result<()> {
    match std::env::var(var) {
        Ok(key) if !key.trim().is_empty() => Ok(()),
        Ok(_) => Err(C3Error::Config(format!(
            "{} is empty. Set it with: export {}='...'",
            var, var
        ))),
        Err(_) => Err(C3Error::Config(format!(
            "{} not set. Set it with: export {}='...'",
            var, var
        ))),
    }
}

/// Check that the dataset file exists.
fn check_dataset(settings: &Settings) -> Result<()> {
    let path = settings.dataset_path();
    if path.exists() {
        Ok(())
    } else {
        Err(C3Error::Dataset(format!(
            "Data file not found at: {}",
            path.display()
        )))
    }
}
