//! Terminal output for the `acs` subcommands.
//!
//! Formatting lives here so the pipeline code only returns data.

use std::path::Path;

use crate::app::pipeline::RunOutput;
use crate::data::plan_chunks;
use crate::domain::{RunConfig, VariableMap};
use crate::geoid::{GeoidError, Level, ParsedLabel, ReferenceTable};

/// Summary of a completed pull.
pub fn format_run_summary(config: &RunConfig, output: &RunOutput, path: &Path) -> String {
    let mut out = String::new();

    out.push_str("=== acs - ACS block-group pull ===\n");
    out.push_str(&format!(
        "Survey: {} {} | State: {}{}\n",
        config.dataset,
        config.year,
        config.state,
        config
            .county
            .as_deref()
            .map(|c| format!(" County: {c}"))
            .unwrap_or_default()
    ));
    out.push_str(&format!(
        "Variables: {} in {} chunk(s) of {}\n",
        output.variables.len(),
        output.chunk_count,
        output.chunk_size
    ));
    out.push_str(&format!(
        "Block groups: {} reference, {} output rows ({} join)\n",
        output.reference.len(),
        output.table.len(),
        format!("{:?}", config.join).to_lowercase()
    ));
    let dups = output.reference.duplicate_count();
    if dups > 0 {
        out.push_str(&format!("Repeated GEOIDs in reference: {dups}\n"));
    }
    out.push_str(&format!("Columns: {}\n", output.table.columns().join(", ")));
    out.push_str(&format!("Wrote: {}", path.display()));
    out
}

/// Summary of a geography-only pull.
pub fn format_reference_summary(reference: &ReferenceTable, path: &Path) -> String {
    format!(
        "Block groups: {} ({} repeated GEOIDs)\nWrote: {}",
        reference.len(),
        reference.duplicate_count(),
        path.display()
    )
}

/// One block per chunk listing `code -> label`.
pub fn format_chunk_plan(map: &VariableMap, chunk_size: usize) -> String {
    let chunks = plan_chunks(map, chunk_size);
    let mut out = format!(
        "{} variable(s), chunk size {}, {} chunk(s)",
        map.len(),
        chunk_size,
        chunks.len()
    );
    for (i, chunk) in chunks.iter().enumerate() {
        out.push_str(&format!("\n[chunk {}]", i + 1));
        for spec in *chunk {
            out.push_str(&format!("\n  {} -> {}", spec.code, spec.label));
        }
    }
    out
}

/// One line per label: GEOID and parts, or the reason it failed.
pub fn format_parsed_label(label: &str, result: &Result<ParsedLabel, GeoidError>) -> String {
    match result {
        Ok(parsed) => {
            let parts = Level::ALL
                .iter()
                .map(|l| format!("{}={}", l.column(), parsed.parts.get(*l)))
                .collect::<Vec<_>>()
                .join(" ");
            format!("{} {parts}", parsed.parts.geoid())
        }
        Err(e) => format!("error: {label}: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::VariableSpec;
    use crate::geoid::parse_label;

    #[test]
    fn chunk_plan_lists_every_variable() {
        let map = VariableMap::new(
            ["A", "B", "C"]
                .iter()
                .map(|c| VariableSpec {
                    code: format!("{c}_001E"),
                    label: format!("COL_{c}"),
                })
                .collect(),
        );
        let text = format_chunk_plan(&map, 2);
        assert!(text.starts_with("3 variable(s), chunk size 2, 2 chunk(s)"));
        assert!(text.contains("[chunk 2]\n  C_001E -> COL_C"));
    }

    #[test]
    fn parsed_label_line() {
        let label = "Summary level: 150,state:37,county:001,tract:000100,block group:1";
        let line = format_parsed_label(label, &parse_label(label));
        assert_eq!(
            line,
            "370010001001 STATE=37 COUNTY=001 TRACT=000100 BLOCK_GROUP=1"
        );

        let bad = "state:37";
        let line = format_parsed_label(bad, &parse_label(bad));
        assert_eq!(line, "error: state:37: missing `county` segment");
    }
}
