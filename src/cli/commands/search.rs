//! Search command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::rag::Retriever;
use crate::vector_store;
use anyhow::Result;

/// Run the search command.
pub async fn run_search(query: &str, limit: Option<usize>, mut settings: Settings) -> Result<()> {
    if let Some(limit) = limit {
        settings.rag.top_k = limit;
    }

    if let Err(e) = preflight::check(Operation::Search, &settings) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let store = vector_store::from_settings(&settings)?;
    let retriever = Retriever::from_settings(&settings, store)?;

    let spinner = Output::spinner("Searching...");
    let results = retriever.search(query).await;
    spinner.finish_and_clear();

    match results {
        Ok(matches) if matches.is_empty() => {
            Output::warning("No specific database information found for this question.");
        }
        Ok(matches) => {
            Output::success(&format!("Found {} documents", matches.len()));
            for m in &matches {
                Output::search_result(&m.document.id, m.score, &m.document.text);
            }
        }
        Err(e) => {
            Output::error(&format!("Search failed: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
