//! Run manifest written next to the result CSV.
//!
//! Records what was pulled and how, so a CSV can be traced back to its run.

use std::fs::File;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::{JoinPolicy, RunConfig};
use crate::error::AppError;
use crate::table::WideTable;

#[derive(Debug, Clone, Serialize)]
pub struct RunManifest {
    pub tool: String,
    pub generated_at: DateTime<Utc>,
    pub year: u16,
    pub dataset: String,
    pub state: String,
    pub county: Option<String>,
    pub join: JoinPolicy,
    pub variable_count: usize,
    pub chunk_size: usize,
    pub chunk_count: usize,
    pub reference_rows: usize,
    pub rows: usize,
    pub columns: Vec<String>,
    pub output: String,
}

impl RunManifest {
    pub fn new(
        config: &RunConfig,
        chunk_size: usize,
        chunk_count: usize,
        reference_rows: usize,
        table: &WideTable,
        output: &Path,
    ) -> Self {
        Self {
            tool: "acs".to_string(),
            generated_at: Utc::now(),
            year: config.year,
            dataset: config.dataset.clone(),
            state: config.state.clone(),
            county: config.county.clone(),
            join: config.join,
            variable_count: table.variable_columns.len(),
            chunk_size,
            chunk_count,
            reference_rows,
            rows: table.len(),
            columns: table.header().into_iter().map(str::to_string).collect(),
            output: output.display().to_string(),
        }
    }
}

pub fn write_manifest_json(path: &Path, manifest: &RunManifest) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::config(format!("Failed to create manifest '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(file, manifest)
        .map_err(|e| AppError::config(format!("Failed to write manifest JSON: {e}")))?;
    Ok(())
}
