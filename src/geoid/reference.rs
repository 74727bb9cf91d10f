//! Geography reference table: one row per enumerated block group.

use std::collections::HashSet;

use tracing::warn;

use super::parser::parse_label;
use super::types::{Geoid, GeoidParts};
use crate::error::AppError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceRow {
    pub geoid: Geoid,
    pub parts: GeoidParts,
}

/// Reference rows in enumeration order. GEOIDs are not deduplicated.
#[derive(Debug, Clone, Default)]
pub struct ReferenceTable {
    pub rows: Vec<ReferenceRow>,
}

impl ReferenceTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn geoids(&self) -> impl Iterator<Item = &Geoid> {
        self.rows.iter().map(|r| &r.geoid)
    }

    /// Number of rows whose GEOID already appeared earlier in the table.
    pub fn duplicate_count(&self) -> usize {
        let mut seen = HashSet::with_capacity(self.rows.len());
        self.rows.iter().filter(|r| !seen.insert(&r.geoid)).count()
    }
}

/// Build the reference table from enumeration labels, one row per label.
pub fn build_reference<S: AsRef<str>>(labels: &[S]) -> Result<ReferenceTable, AppError> {
    let mut rows = Vec::with_capacity(labels.len());
    for (idx, label) in labels.iter().enumerate() {
        let label = label.as_ref();
        let parsed = parse_label(label).map_err(|e| {
            AppError::shape(format!(
                "Geography label #{} '{label}' does not decompose into a block group: {e}",
                idx + 1
            ))
        })?;
        rows.push(ReferenceRow {
            geoid: parsed.parts.geoid(),
            parts: parsed.parts,
        });
    }

    let table = ReferenceTable { rows };
    let dups = table.duplicate_count();
    if dups > 0 {
        warn!(duplicates = dups, "geography reference contains repeated GEOIDs");
    }
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn label(tract: &str, bg: &str) -> String {
        format!("Summary level: 150, state:37> county:001> tract:{tract}> block group:{bg}")
    }

    #[test]
    fn one_row_per_label_in_order() {
        let labels = vec![label("000100", "1"), label("000100", "2"), label("000200", "1")];
        let table = build_reference(&labels).unwrap();
        assert_eq!(table.len(), labels.len());
        let ids: Vec<&str> = table.geoids().map(Geoid::as_str).collect();
        assert_eq!(ids, ["370010001001", "370010001002", "370010002001"]);
        assert_eq!(table.rows[2].parts.tract(), "000200");
    }

    #[test]
    fn duplicate_geoids_are_kept() {
        let labels = vec![label("000100", "1"), label("000100", "1")];
        let table = build_reference(&labels).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.duplicate_count(), 1);
    }

    #[test]
    fn bad_label_aborts_with_position() {
        let labels = vec![label("000100", "1"), "Summary level: 150, state:37> county:001".to_string()];
        let err = build_reference(&labels).unwrap_err();
        assert_eq!(err.exit_code(), 3);
        assert!(err.to_string().contains("#2"), "{err}");
    }

    #[test]
    fn empty_input_gives_empty_table() {
        let labels: Vec<String> = Vec::new();
        assert!(build_reference(&labels).unwrap().is_empty());
    }
}
