//! Vector store connectivity check.

use crate::cli::Output;
use crate::config::Settings;
use crate::vector_store;
use anyhow::Result;
use std::time::{Duration, Instant};

/// Responses slower than this are reported as a warning.
const SLOW_RESPONSE: Duration = Duration::from_secs(5);

/// Run the ping command.
pub async fn run_ping(settings: Settings) -> Result<()> {
    Output::header("Vector store connectivity");
    Output::kv("URL", &settings.vector_store.url);
    Output::kv(
        "Auth token",
        if settings.chroma_api_key().is_some() {
            "set"
        } else {
            "not set"
        },
    );

    let store = vector_store::from_settings(&settings)?;
    let spinner = Output::spinner("Connecting...");

    let started = Instant::now();
    let result = store.heartbeat().await;
    let elapsed = started.elapsed();
    spinner.finish_and_clear();

    match result {
        Ok(()) => {
            Output::success(&format!(
                "Connected in {:.2}s",
                elapsed.as_secs_f64()
            ));
            if elapsed > SLOW_RESPONSE {
                Output::warning("The vector store is responding slowly.");
            }
            Ok(())
        }
        Err(e) => {
            Output::error(&format!("Connection failed: {}", e));
            Err(e.into())
        }
    }
}
