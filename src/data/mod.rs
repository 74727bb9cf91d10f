//! Remote data: the Census API client and the chunked variable fetcher.

pub mod census;
pub mod fetch;

pub use census::{CensusClient, CensusSource, Cell, LabeledValue};
pub use fetch::{ChunkedVariableFetcher, chunk_size, plan_chunks};
