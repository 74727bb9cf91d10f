//! Tables produced by a pull and the GEOID join that combines them.

pub mod assemble;

pub use assemble::assemble;

use crate::data::Cell;
use crate::geoid::{Geoid, GeoidParts, Level};

/// Index column of every output table.
pub const GEOID_COLUMN: &str = "GEOID";

/// One fetched variable, already renamed to its output column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableTable {
    pub code: String,
    pub column: String,
    pub rows: Vec<(Geoid, Cell)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WideRow {
    pub geoid: Geoid,
    pub parts: GeoidParts,
    /// One cell per variable column, in column order.
    pub values: Vec<Cell>,
}

/// GEOID-indexed result: geography parts followed by one column per variable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WideTable {
    pub variable_columns: Vec<String>,
    pub rows: Vec<WideRow>,
}

impl WideTable {
    /// Data columns (excluding the GEOID index).
    pub fn columns(&self) -> Vec<&str> {
        Level::ALL
            .iter()
            .map(|l| l.column())
            .chain(self.variable_columns.iter().map(String::as_str))
            .collect()
    }

    /// CSV header: GEOID index then data columns.
    pub fn header(&self) -> Vec<&str> {
        std::iter::once(GEOID_COLUMN).chain(self.columns()).collect()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
