//! Shared domain types.
//!
//! - run configuration (`RunConfig`, `JoinPolicy`, `Scope`)
//! - the ordered variable map (`VariableMap`, `VariableSpec`)

use std::path::PathBuf;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

pub const DEFAULT_BASE_URL: &str = "https://api.census.gov/data";
pub const DEFAULT_STATE: &str = "37";
pub const DEFAULT_YEAR: u16 = 2019;
pub const DEFAULT_DATASET: &str = "acs5";
pub const DEFAULT_VARIABLES_PATH: &str = "config/acs_dd.json";
pub const DEFAULT_OUTPUT_DIR: &str = "data/raw";
pub const DEFAULT_BATCH_DIVISOR: usize = 15;

/// How variable tables are joined onto the geography reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum JoinPolicy {
    /// Every variable must cover exactly the reference GEOIDs.
    Strict,
    /// Keep every GEOID seen anywhere; absent observations are left empty.
    Outer,
}

/// One requested ACS variable and the column it is renamed to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VariableSpec {
    pub code: String,
    pub label: String,
}

/// Variable code → output label, in configuration order.
///
/// Order matters: it is both the fetch order and the output column order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariableMap {
    pub entries: Vec<VariableSpec>,
}

impl VariableMap {
    pub fn new(entries: Vec<VariableSpec>) -> Self {
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.code.as_str())
    }
}

/// The geographic and survey coordinates of a pull.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scope {
    pub year: u16,
    pub dataset: String,
    pub state: String,
    /// `None` means every county in the state.
    pub county: Option<String>,
}

/// Everything a run needs, resolved up front.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Two-digit state FIPS code.
    pub state: String,
    /// Optional three-digit county FIPS code.
    pub county: Option<String>,
    /// Survey year (the vintage the API serves, e.g. 2019 for the 2015-2019 5-year).
    pub year: u16,
    /// ACS product path segment, e.g. `acs5`.
    pub dataset: String,
    /// JSON object of variable code → output label.
    pub variables_path: PathBuf,
    /// Directory the CSV and manifest are written to.
    pub output_dir: PathBuf,
    /// Explicit chunk size; overrides `batch_divisor` when set.
    pub batch_size: Option<usize>,
    /// Chunk size is `floor(variable_count / batch_divisor)` when no explicit size is set.
    pub batch_divisor: usize,
    pub join: JoinPolicy,
    pub base_url: String,
    pub api_key: Option<String>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            state: DEFAULT_STATE.to_string(),
            county: None,
            year: DEFAULT_YEAR,
            dataset: DEFAULT_DATASET.to_string(),
            variables_path: PathBuf::from(DEFAULT_VARIABLES_PATH),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            batch_size: None,
            batch_divisor: DEFAULT_BATCH_DIVISOR,
            join: JoinPolicy::Strict,
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
        }
    }
}

impl RunConfig {
    pub fn scope(&self) -> Scope {
        Scope {
            year: self.year,
            dataset: self.dataset.clone(),
            state: self.state.clone(),
            county: self.county.clone(),
        }
    }

    pub fn output_path(&self) -> PathBuf {
        self.output_dir.join(format!("acs_{}_raw.csv", self.year))
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.output_dir
            .join(format!("acs_{}_raw.manifest.json", self.year))
    }

    pub fn reference_path(&self) -> PathBuf {
        self.output_dir
            .join(format!("acs_{}_geographies.csv", self.year))
    }

    /// Reject settings that would otherwise surface as confusing API errors.
    pub fn validate(&self) -> Result<(), AppError> {
        if !is_digits(&self.state, 2) {
            return Err(AppError::config(format!(
                "State code '{}' must be a two-digit FIPS code.",
                self.state
            )));
        }
        if let Some(county) = &self.county {
            if !is_digits(county, 3) {
                return Err(AppError::config(format!(
                    "County code '{county}' must be a three-digit FIPS code."
                )));
            }
        }
        if self.dataset.trim().is_empty() {
            return Err(AppError::config("Dataset must not be empty."));
        }
        if self.batch_divisor == 0 {
            return Err(AppError::config("Batch divisor must be at least 1."));
        }
        if self.batch_size == Some(0) {
            return Err(AppError::config("Batch size must be at least 1."));
        }
        Ok(())
    }
}

fn is_digits(s: &str, width: usize) -> bool {
    s.len() == width && s.bytes().all(|b| b.is_ascii_digit())
}
