//! Static career dataset used to seed the knowledge base.

use crate::error::{C3Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// One career path as stored in the dataset file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CareerRecord {
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub exams: Vec<String>,
    #[serde(default)]
    pub top_colleges: Vec<String>,
}

impl CareerRecord {
    /// Text blob that gets embedded and stored for this record.
    ///
    /// The layout is fixed so that reseeding yields identical documents.
    pub fn document_text(&self) -> String {
        format!(
            "Career: {}\nDescription: {}\nExams: {}\nColleges: {}",
            self.title,
            self.description,
            self.exams.join(", "),
            self.top_colleges.join(", ")
        )
    }
}

/// Load career records from a JSON array file.
pub fn load_records(path: &Path) -> Result<Vec<CareerRecord>> {
    if !path.exists() {
        return Err(C3Error::Dataset(format!(
            "Data file not found at: {}",
            path.display()
        )));
    }

    let content = std::fs::read_to_string(path)?;
    parse_records(&content)
}

/// Parse career records from JSON text. Duplicate IDs are rejected.
pub fn parse_records(json: &str) -> Result<Vec<CareerRecord>> {
    let records: Vec<CareerRecord> = serde_json::from_str(json)?;

    let mut seen = HashSet::new();
    for record in &records {
        if !seen.insert(record.id.as_str()) {
            return Err(C3Error::Dataset(format!("Duplicate career id: {}", record.id)));
        }
    }

    Ok(records)
}
