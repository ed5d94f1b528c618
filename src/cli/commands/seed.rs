//! Seed command implementation.

use crate::careers::load_records;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::seeder::Seeder;
use anyhow::Result;

/// Run the seed command.
pub async fn run_seed(data: Option<String>, mut settings: Settings) -> Result<()> {
    if let Some(path) = data {
        settings.general.dataset_path = path;
    }

    if let Err(e) = preflight::check(Operation::Seed, &settings) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    Output::header("Seeding knowledge base");
    Output::kv("Dataset", &settings.dataset_path().display().to_string());
    Output::kv("Collection", &settings.vector_store.collection);
    Output::kv("Vector store", &settings.vector_store.url);

    let records = load_records(&settings.dataset_path())?;
    Output::info(&format!("Processing {} career paths...", records.len()));

    let progress = Output::progress_bar(records.len() as u64, "embedding");
    let seeder = Seeder::from_settings(&settings)?.with_progress(progress.clone());

    match seeder.seed(&records).await {
        Ok(report) => {
            progress.finish_and_clear();
            Output::success(&format!(
                "Database seeded successfully! ({} documents)",
                report.documents_written
            ));
            Ok(())
        }
        Err(e) => {
            progress.abandon();
            Output::error(&format!("Seeding failed: {}", e));
            Err(e.into())
        }
    }
}
