//! CSV output for the wide result table and the geography reference.

use std::fs::{File, create_dir_all};
use std::path::Path;

use tracing::info;

use crate::error::AppError;
use crate::geoid::{Level, ReferenceTable};
use crate::table::{GEOID_COLUMN, WideTable};

/// Write the wide table: `GEOID,STATE,COUNTY,TRACT,BLOCK_GROUP,<variables...>`.
///
/// Missing observations are written as empty cells.
pub fn write_wide_csv(path: &Path, table: &WideTable) -> Result<(), AppError> {
    let mut writer = create_writer(path)?;

    writer
        .write_record(table.header())
        .map_err(|e| AppError::config(format!("Failed to write CSV header: {e}")))?;

    for row in &table.rows {
        let record = std::iter::once(row.geoid.as_str())
            .chain(Level::ALL.iter().map(|l| row.parts.get(*l)))
            .chain(row.values.iter().map(|v| v.as_deref().unwrap_or("")));
        writer
            .write_record(record)
            .map_err(|e| AppError::config(format!("Failed to write CSV row {}: {e}", row.geoid)))?;
    }

    writer
        .flush()
        .map_err(|e| AppError::config(format!("Failed to flush '{}': {e}", path.display())))?;
    info!(path = %path.display(), rows = table.len(), "wrote result table");
    Ok(())
}

/// Write the geography reference alone (`GEOID` plus the four parts).
pub fn write_reference_csv(path: &Path, reference: &ReferenceTable) -> Result<(), AppError> {
    let mut writer = create_writer(path)?;

    let header = std::iter::once(GEOID_COLUMN).chain(Level::ALL.iter().map(|l| l.column()));
    writer
        .write_record(header)
        .map_err(|e| AppError::config(format!("Failed to write CSV header: {e}")))?;

    for row in &reference.rows {
        let record = std::iter::once(row.geoid.as_str())
            .chain(Level::ALL.iter().map(|l| row.parts.get(*l)));
        writer
            .write_record(record)
            .map_err(|e| AppError::config(format!("Failed to write CSV row {}: {e}", row.geoid)))?;
    }

    writer
        .flush()
        .map_err(|e| AppError::config(format!("Failed to flush '{}': {e}", path.display())))?;
    info!(path = %path.display(), rows = reference.len(), "wrote geography reference");
    Ok(())
}

fn create_writer(path: &Path) -> Result<csv::Writer<File>, AppError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        create_dir_all(parent).map_err(|e| {
            AppError::config(format!(
                "Failed to create output directory '{}': {e}",
                parent.display()
            ))
        })?;
    }
    let file = File::create(path)
        .map_err(|e| AppError::config(format!("Failed to create CSV '{}': {e}", path.display())))?;
    Ok(csv::Writer::from_writer(file))
}
