//! Chunked per-variable fetching.
//!
//! The variable map is walked in consecutive chunks. Chunks only group the
//! iteration (and its logging); every variable is still its own request.

use tracing::{debug, info};

use crate::data::census::CensusSource;
use crate::domain::{Scope, VariableMap, VariableSpec};
use crate::error::AppError;
use crate::geoid::parse_label;
use crate::table::VariableTable;

/// Resolve the chunk size for `total` variables.
///
/// An explicit size wins. Otherwise `floor(total / divisor)`, never below 1 so
/// small maps still get fetched.
pub fn chunk_size(total: usize, batch_size: Option<usize>, divisor: usize) -> usize {
    match batch_size {
        Some(size) => size.max(1),
        None => (total / divisor.max(1)).max(1),
    }
}

/// Split the map into consecutive chunks of `size` (the last one may be short).
pub fn plan_chunks(map: &VariableMap, size: usize) -> Vec<&[VariableSpec]> {
    map.entries.chunks(size.max(1)).collect()
}

pub struct ChunkedVariableFetcher<'a, S: CensusSource + ?Sized> {
    source: &'a S,
    chunk_size: usize,
}

impl<'a, S: CensusSource + ?Sized> ChunkedVariableFetcher<'a, S> {
    pub fn new(source: &'a S, chunk_size: usize) -> Self {
        Self {
            source,
            chunk_size: chunk_size.max(1),
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Fetch every variable in map order. The first failure aborts the pull.
    pub fn fetch_all(&self, scope: &Scope, map: &VariableMap) -> Result<Vec<VariableTable>, AppError> {
        let chunks = plan_chunks(map, self.chunk_size);
        let n_chunks = chunks.len();
        let mut tables = Vec::with_capacity(map.len());

        for (i, chunk) in chunks.into_iter().enumerate() {
            info!(chunk = i + 1, of = n_chunks, variables = chunk.len(), "fetching chunk");
            for spec in chunk {
                tables.push(self.fetch_one(scope, spec)?);
            }
        }

        Ok(tables)
    }

    fn fetch_one(&self, scope: &Scope, spec: &VariableSpec) -> Result<VariableTable, AppError> {
        let values = self.source.variable(scope, &spec.code)?;

        let mut rows = Vec::with_capacity(values.len());
        for v in values {
            let parsed = parse_label(&v.label).map_err(|e| {
                AppError::shape(format!(
                    "Variable {} returned label '{}' that does not decompose into a block group: {e}",
                    spec.code, v.label
                ))
            })?;
            rows.push((parsed.parts.geoid(), v.value));
        }

        debug!(code = %spec.code, column = %spec.label, rows = rows.len(), "fetched variable");
        Ok(VariableTable {
            code: spec.code.clone(),
            column: spec.label.clone(),
            rows,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::HashSet;

    use super::*;
    use crate::data::census::LabeledValue;
    use crate::geoid::{GeoidParts, format_label};

    fn map_of(n: usize) -> VariableMap {
        VariableMap::new(
            (0..n)
                .map(|i| VariableSpec {
                    code: format!("B{i:05}_001E"),
                    label: format!("VAR_{i}"),
                })
                .collect(),
        )
    }

    #[test]
    fn chunk_size_follows_divisor_and_floor() {
        assert_eq!(chunk_size(45, None, 15), 3);
        assert_eq!(chunk_size(44, None, 15), 2);
        assert_eq!(chunk_size(2, None, 15), 1);
        assert_eq!(chunk_size(0, None, 15), 1);
        assert_eq!(chunk_size(45, Some(10), 15), 10);
    }

    #[test]
    fn partition_covers_every_key_once() {
        for (total, size) in [(0usize, 1usize), (1, 1), (7, 3), (30, 2), (31, 4), (5, 10)] {
            let map = map_of(total);
            let chunks = plan_chunks(&map, size);
            assert_eq!(chunks.len(), total.div_ceil(size), "total={total} size={size}");

            let flat: Vec<&str> = chunks.iter().flat_map(|c| c.iter().map(|s| s.code.as_str())).collect();
            assert_eq!(flat, map.codes().collect::<Vec<_>>());
            let unique: HashSet<&str> = flat.iter().copied().collect();
            assert_eq!(unique.len(), total);
            assert!(chunks.iter().all(|c| !c.is_empty() && c.len() <= size));
        }
    }

    /// Records requested codes and answers with one block group.
    struct Recording {
        calls: RefCell<Vec<String>>,
        fail_on: Option<&'static str>,
    }

    impl CensusSource for Recording {
        fn geographies(&self, _scope: &Scope) -> Result<Vec<String>, AppError> {
            Ok(Vec::new())
        }

        fn variable(&self, _scope: &Scope, code: &str) -> Result<Vec<LabeledValue>, AppError> {
            self.calls.borrow_mut().push(code.to_string());
            if self.fail_on == Some(code) {
                return Err(AppError::remote(format!("unknown variable '{code}'")));
            }
            let parts = GeoidParts::from_codes("37", "001", "000100", "1").unwrap();
            Ok(vec![LabeledValue {
                label: format_label("BG 1", &parts),
                value: Some("1".to_string()),
            }])
        }
    }

    fn scope() -> Scope {
        Scope {
            year: 2019,
            dataset: "acs5".to_string(),
            state: "37".to_string(),
            county: None,
        }
    }

    #[test]
    fn one_request_per_variable_in_order() {
        let source = Recording {
            calls: RefCell::new(Vec::new()),
            fail_on: None,
        };
        let map = map_of(5);
        let tables = ChunkedVariableFetcher::new(&source, 2)
            .fetch_all(&scope(), &map)
            .unwrap();

        assert_eq!(*source.calls.borrow(), map.codes().collect::<Vec<_>>());
        let columns: Vec<&str> = tables.iter().map(|t| t.column.as_str()).collect();
        assert_eq!(columns, ["VAR_0", "VAR_1", "VAR_2", "VAR_3", "VAR_4"]);
        assert_eq!(tables[0].rows[0].0.as_str(), "370010001001");
    }

    #[test]
    fn first_failure_aborts_remaining_fetches() {
        let source = Recording {
            calls: RefCell::new(Vec::new()),
            fail_on: Some("B00001_001E"),
        };
        let err = ChunkedVariableFetcher::new(&source, 1)
            .fetch_all(&scope(), &map_of(4))
            .unwrap_err();
        assert_eq!(err.exit_code(), 4);
        assert_eq!(source.calls.borrow().len(), 2);
    }
}
