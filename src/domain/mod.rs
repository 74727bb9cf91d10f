//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - the resolved run configuration (`RunConfig`) and its defaults
//! - the ordered variable map (`VariableMap`)

pub mod types;

pub use types::*;
