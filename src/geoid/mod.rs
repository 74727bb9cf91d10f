//! Block-group GEOIDs: types, label parsing and the geography reference table.

pub mod parser;
pub mod reference;
pub mod types;

pub use parser::{ParsedLabel, format_label, parse_label};
pub use reference::{ReferenceRow, ReferenceTable, build_reference};
pub use types::*;
