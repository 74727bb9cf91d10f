//! Input/output helpers.
//!
//! - variable map loading (`variables`)
//! - CSV exports (`export`)
//! - run manifest JSON (`manifest`)

pub mod export;
pub mod manifest;
pub mod variables;

pub use export::*;
pub use manifest::*;
pub use variables::*;
