//! Join the geography reference with every variable table on GEOID.
//!
//! Reference rows are the spine and keep their order. Variable tables may
//! arrive in any row order; they are looked up by GEOID, never by position.

use std::collections::{HashMap, HashSet};

use tracing::{info, warn};

use super::{GEOID_COLUMN, VariableTable, WideRow, WideTable};
use crate::data::Cell;
use crate::domain::JoinPolicy;
use crate::error::AppError;
use crate::geoid::{Geoid, Level, ReferenceTable};

/// Build the wide table.
///
/// - `Strict`: each variable must cover exactly the reference GEOIDs.
/// - `Outer`: missing observations stay empty, and GEOIDs only seen in
///   variable tables are appended after the reference rows.
pub fn assemble(
    reference: &ReferenceTable,
    tables: &[VariableTable],
    policy: JoinPolicy,
) -> Result<WideTable, AppError> {
    check_columns(tables)?;

    let indexes = tables
        .iter()
        .map(index_table)
        .collect::<Result<Vec<_>, _>>()?;

    let reference_keys: HashSet<&Geoid> = reference.geoids().collect();

    if policy == JoinPolicy::Strict {
        for (table, index) in tables.iter().zip(&indexes) {
            check_alignment(table, index, &reference_keys)?;
        }
    }

    let lookup = |geoid: &Geoid| -> Vec<Cell> {
        indexes
            .iter()
            .map(|index| index.get(geoid).and_then(|cell| (*cell).clone()))
            .collect()
    };

    let mut rows: Vec<WideRow> = reference
        .rows
        .iter()
        .map(|r| WideRow {
            geoid: r.geoid.clone(),
            parts: r.parts.clone(),
            values: lookup(&r.geoid),
        })
        .collect();

    if policy == JoinPolicy::Outer {
        let mut appended: HashSet<&Geoid> = HashSet::new();
        for table in tables {
            for (geoid, _) in &table.rows {
                if !reference_keys.contains(geoid) && appended.insert(geoid) {
                    rows.push(WideRow {
                        geoid: geoid.clone(),
                        parts: geoid.parts(),
                        values: lookup(geoid),
                    });
                }
            }
        }
        if !appended.is_empty() {
            warn!(
                extra = appended.len(),
                "variable tables carried GEOIDs missing from the geography reference"
            );
        }
    }

    let table = WideTable {
        variable_columns: tables.iter().map(|t| t.column.clone()).collect(),
        rows,
    };
    info!(rows = table.len(), columns = table.columns().len(), "assembled result table");
    Ok(table)
}

fn check_columns(tables: &[VariableTable]) -> Result<(), AppError> {
    let mut seen: HashSet<&str> = std::iter::once(GEOID_COLUMN)
        .chain(Level::ALL.iter().map(|l| l.column()))
        .collect();
    for table in tables {
        if !seen.insert(table.column.as_str()) {
            return Err(AppError::config(format!(
                "Output column '{}' (variable {}) is used more than once.",
                table.column, table.code
            )));
        }
    }
    Ok(())
}

fn index_table(table: &VariableTable) -> Result<HashMap<&Geoid, &Cell>, AppError> {
    let mut index = HashMap::with_capacity(table.rows.len());
    for (geoid, cell) in &table.rows {
        if index.insert(geoid, cell).is_some() {
            return Err(AppError::shape(format!(
                "Variable {} returned GEOID {geoid} more than once.",
                table.code
            )));
        }
    }
    Ok(index)
}

fn check_alignment(
    table: &VariableTable,
    index: &HashMap<&Geoid, &Cell>,
    reference_keys: &HashSet<&Geoid>,
) -> Result<(), AppError> {
    let missing: Vec<&Geoid> = reference_keys
        .iter()
        .filter(|g| !index.contains_key(*g))
        .copied()
        .collect();
    let unexpected: Vec<&Geoid> = index
        .keys()
        .filter(|g| !reference_keys.contains(*g))
        .copied()
        .collect();

    if missing.is_empty() && unexpected.is_empty() {
        return Ok(());
    }

    Err(AppError::shape(format!(
        "Variable {} ({}) does not align with the geography reference: \
         {} GEOID(s) missing{}, {} unexpected{}.",
        table.code,
        table.column,
        missing.len(),
        example(&missing),
        unexpected.len(),
        example(&unexpected),
    )))
}

fn example(geoids: &[&Geoid]) -> String {
    geoids
        .iter()
        .min()
        .map(|g| format!(" (e.g. {g})"))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geoid::build_reference;

    const G1: &str = "370010001001";
    const G2: &str = "370010001002";
    const G3: &str = "370010002001";

    fn reference() -> ReferenceTable {
        let labels: Vec<String> = [G1, G2, G3]
            .iter()
            .map(|g| {
                let p = Geoid::parse(g).unwrap().parts();
                format!(
                    "Summary level: 150, state:{}> county:{}> tract:{}> block group:{}",
                    p.state(), p.county(), p.tract(), p.block_group()
                )
            })
            .collect();
        build_reference(&labels).unwrap()
    }

    fn variable(code: &str, column: &str, rows: &[(&str, &str)]) -> VariableTable {
        VariableTable {
            code: code.to_string(),
            column: column.to_string(),
            rows: rows
                .iter()
                .map(|(g, v)| (Geoid::parse(g).unwrap(), Some(v.to_string())))
                .collect(),
        }
    }

    #[test]
    fn joins_by_geoid_regardless_of_row_order() {
        let pop = variable("B01001_001E", "TOTAL_POP", &[(G3, "30"), (G1, "10"), (G2, "20")]);
        let age = variable("B01002_001E", "MEDIAN_AGE", &[(G2, "41.5"), (G3, "38.0"), (G1, "35.2")]);
        let wide = assemble(&reference(), &[pop, age], JoinPolicy::Strict).unwrap();

        assert_eq!(wide.len(), 3);
        assert_eq!(
            wide.header(),
            ["GEOID", "STATE", "COUNTY", "TRACT", "BLOCK_GROUP", "TOTAL_POP", "MEDIAN_AGE"]
        );
        assert_eq!(wide.rows[0].geoid.as_str(), G1);
        assert_eq!(
            wide.rows[0].values,
            [Some("10".to_string()), Some("35.2".to_string())]
        );
        assert_eq!(
            wide.rows[2].values,
            [Some("30".to_string()), Some("38.0".to_string())]
        );
    }

    #[test]
    fn strict_join_rejects_missing_geoids() {
        let pop = variable("B01001_001E", "TOTAL_POP", &[(G1, "10"), (G2, "20")]);
        let err = assemble(&reference(), &[pop], JoinPolicy::Strict).unwrap_err();
        assert_eq!(err.exit_code(), 3);
        assert!(err.to_string().contains("1 GEOID(s) missing"), "{err}");
        assert!(err.to_string().contains(G3), "{err}");
    }

    #[test]
    fn outer_join_fills_blanks_and_appends_extras() {
        let extra = "370010003001";
        let pop = variable("B01001_001E", "TOTAL_POP", &[(G1, "10"), (extra, "99")]);
        let wide = assemble(&reference(), &[pop], JoinPolicy::Outer).unwrap();

        assert_eq!(wide.len(), 4);
        assert_eq!(wide.rows[1].values, [None::<String>]);
        assert_eq!(wide.rows[3].geoid.as_str(), extra);
        assert_eq!(wide.rows[3].parts.tract(), "000300");
        assert_eq!(wide.rows[3].values, [Some("99".to_string())]);
    }

    #[test]
    fn duplicate_geoid_in_variable_is_rejected() {
        let pop = variable("B01001_001E", "TOTAL_POP", &[(G1, "10"), (G1, "11")]);
        assert!(assemble(&reference(), &[pop], JoinPolicy::Outer).is_err());
    }

    #[test]
    fn duplicate_output_columns_are_config_errors() {
        let a = variable("B01001_001E", "POP", &[(G1, "1"), (G2, "2"), (G3, "3")]);
        let b = variable("B01003_001E", "POP", &[(G1, "1"), (G2, "2"), (G3, "3")]);
        assert_eq!(
            assemble(&reference(), &[a, b], JoinPolicy::Strict)
                .unwrap_err()
                .exit_code(),
            2
        );

        let clash = variable("B01001_001E", "STATE", &[(G1, "1"), (G2, "2"), (G3, "3")]);
        assert!(assemble(&reference(), &[clash], JoinPolicy::Strict).is_err());
    }

    #[test]
    fn duplicated_reference_rows_each_get_values() {
        let labels = vec![
            "Summary level: 150, state:37> county:001> tract:000100> block group:1",
            "Summary level: 150, state:37> county:001> tract:000100> block group:1",
        ];
        let reference = build_reference(&labels).unwrap();
        let pop = variable("B01001_001E", "TOTAL_POP", &[(G1, "10")]);
        let wide = assemble(&reference, &[pop], JoinPolicy::Strict).unwrap();
        assert_eq!(wide.len(), 2);
        assert!(wide.rows.iter().all(|r| r.values == [Some("10".to_string())]));
    }
}
