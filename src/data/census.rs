//! Census data API integration.
//!
//! Both calls hit the same endpoint, `{base}/{year}/acs/{dataset}`, asking for
//! every block group of a state:
//!
//! - geography enumeration: `get=NAME`
//! - variable query: `get=NAME,{code}`
//!
//! The API answers with a JSON array of arrays whose first row is the header.
//! Each data row is rendered into a row-identifier label
//! (`{NAME}: Summary level: 150, state:..> county:..> tract:..> block group:..`)
//! so that GEOIDs are always derived by the label parser.

use std::collections::HashMap;

use reqwest::StatusCode;
use reqwest::blocking::Client;
use serde_json::Value;
use tracing::debug;

use crate::domain::Scope;
use crate::error::AppError;
use crate::geoid::{GeoidParts, Level, format_label};

const NAME_COLUMN: &str = "NAME";
const BODY_EXCERPT: usize = 300;

/// One observation cell as the API returned it; `None` for JSON null.
pub type Cell = Option<String>;

/// A single variable observation attached to its geography label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabeledValue {
    pub label: String,
    pub value: Cell,
}

/// Anything that can answer the two queries a pull needs.
pub trait CensusSource {
    /// Labels of every block group in scope.
    fn geographies(&self, scope: &Scope) -> Result<Vec<String>, AppError>;

    /// One variable for every block group in scope.
    fn variable(&self, scope: &Scope, code: &str) -> Result<Vec<LabeledValue>, AppError>;
}

pub struct CensusClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl CensusClient {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        }
    }

    /// Read `CENSUS_API_KEY` from the environment (or `.env`); the key is optional.
    pub fn api_key_from_env() -> Option<String> {
        dotenvy::dotenv().ok();
        std::env::var("CENSUS_API_KEY")
            .ok()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
    }

    fn endpoint(&self, scope: &Scope) -> String {
        format!("{}/{}/acs/{}", self.base_url, scope.year, scope.dataset)
    }

    fn fetch_table(&self, scope: &Scope, get: &str) -> Result<Vec<Vec<Value>>, AppError> {
        let url = self.endpoint(scope);
        let params = query_params(scope, get, self.api_key.as_deref());

        debug!(%url, get, within = %in_predicate(scope), "census request");
        let resp = self
            .client
            .get(&url)
            .query(&params)
            .send()
            .map_err(|e| AppError::remote(format!("Census request failed: {e}")))?;

        let status = resp.status();
        let body = resp
            .text()
            .map_err(|e| AppError::remote(format!("Failed to read Census response: {e}")))?;

        table_from_response(status, &body, get)
    }
}

/// Query string for one block-group request; `key` only when one is configured.
fn query_params(scope: &Scope, get: &str, api_key: Option<&str>) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("get", get.to_string()),
        ("for", format!("{}:*", Level::BlockGroup.api_name())),
        ("in", in_predicate(scope)),
    ];
    if let Some(key) = api_key {
        params.push(("key", key.to_string()));
    }
    params
}

/// Check the status and decode the body of a Census response.
///
/// Any non-success status or non-JSON body is a remote error carrying a
/// trimmed excerpt of what the API sent back.
pub fn table_from_response(
    status: StatusCode,
    body: &str,
    get: &str,
) -> Result<Vec<Vec<Value>>, AppError> {
    if !status.is_success() {
        return Err(AppError::remote(format!(
            "Census request for '{get}' failed with status {status}: {}",
            excerpt(body)
        )));
    }

    serde_json::from_str(body).map_err(|e| {
        AppError::remote(format!(
            "Failed to parse Census response for '{get}': {e} (body: {})",
            excerpt(body)
        ))
    })
}

impl CensusSource for CensusClient {
    fn geographies(&self, scope: &Scope) -> Result<Vec<String>, AppError> {
        let table = self.fetch_table(scope, NAME_COLUMN)?;
        labels_from_table(&table)
    }

    fn variable(&self, scope: &Scope, code: &str) -> Result<Vec<LabeledValue>, AppError> {
        let table = self.fetch_table(scope, &format!("{NAME_COLUMN},{code}"))?;
        values_from_table(&table, code)
    }
}

/// `state:SS county:* tract:*`, or a single county when one is configured.
fn in_predicate(scope: &Scope) -> String {
    format!(
        "{}:{} {}:{} {}:*",
        Level::State.api_name(),
        scope.state,
        Level::County.api_name(),
        scope.county.as_deref().unwrap_or("*"),
        Level::Tract.api_name()
    )
}

fn excerpt(body: &str) -> String {
    let trimmed = body.trim();
    match trimmed.char_indices().nth(BODY_EXCERPT) {
        Some((idx, _)) => format!("{}...", &trimmed[..idx]),
        None => trimmed.to_string(),
    }
}

/// Column positions of a response header.
struct Header {
    columns: HashMap<String, usize>,
    width: usize,
}

impl Header {
    fn from_table(table: &[Vec<Value>]) -> Result<Self, AppError> {
        let first = table
            .first()
            .ok_or_else(|| AppError::remote("Census response is empty (no header row)."))?;
        let mut columns = HashMap::with_capacity(first.len());
        for (idx, cell) in first.iter().enumerate() {
            let name = cell
                .as_str()
                .ok_or_else(|| AppError::remote(format!("Census header cell {idx} is not a string.")))?;
            columns.insert(name.to_string(), idx);
        }
        Ok(Self {
            columns,
            width: first.len(),
        })
    }

    fn require(&self, name: &str) -> Result<usize, AppError> {
        self.columns
            .get(name)
            .copied()
            .ok_or_else(|| AppError::remote(format!("Census response has no '{name}' column.")))
    }
}

/// Geography columns resolved once per response.
struct GeoColumns {
    name: usize,
    levels: [usize; 4],
}

impl GeoColumns {
    fn resolve(header: &Header) -> Result<Self, AppError> {
        let mut levels = [0usize; 4];
        for level in Level::ALL {
            levels[level.index()] = header.require(level.api_name())?;
        }
        Ok(Self {
            name: header.require(NAME_COLUMN)?,
            levels,
        })
    }

    fn label(&self, row: &[Value], line: usize) -> Result<String, AppError> {
        let text = |idx: usize| row.get(idx).and_then(Value::as_str).unwrap_or("");
        let parts = GeoidParts::from_codes(
            text(self.levels[0]),
            text(self.levels[1]),
            text(self.levels[2]),
            text(self.levels[3]),
        )
        .map_err(|e| AppError::shape(format!("Census response row {line}: {e}")))?;
        Ok(format_label(text(self.name), &parts))
    }
}

fn check_width(row: &[Value], header: &Header, line: usize) -> Result<(), AppError> {
    if row.len() != header.width {
        return Err(AppError::remote(format!(
            "Census response row {line} has {} cells, header has {}.",
            row.len(),
            header.width
        )));
    }
    Ok(())
}

/// Turn a `get=NAME` response into geography labels, in response order.
pub fn labels_from_table(table: &[Vec<Value>]) -> Result<Vec<String>, AppError> {
    let header = Header::from_table(table)?;
    let geo = GeoColumns::resolve(&header)?;

    let mut labels = Vec::with_capacity(table.len().saturating_sub(1));
    for (idx, row) in table.iter().enumerate().skip(1) {
        check_width(row, &header, idx)?;
        labels.push(geo.label(row, idx)?);
    }
    Ok(labels)
}

/// Turn a `get=NAME,{code}` response into labeled observations.
pub fn values_from_table(table: &[Vec<Value>], code: &str) -> Result<Vec<LabeledValue>, AppError> {
    let header = Header::from_table(table)?;
    let geo = GeoColumns::resolve(&header)?;
    let value_idx = header.require(code)?;
    if header.width != 2 + Level::ALL.len() {
        let mut extra: Vec<(usize, &str)> = header
            .columns
            .iter()
            .filter(|(name, _)| {
                name.as_str() != NAME_COLUMN
                    && name.as_str() != code
                    && Level::from_api_name(name).is_none()
            })
            .map(|(name, idx)| (*idx, name.as_str()))
            .collect();
        extra.sort_unstable();
        let names: Vec<&str> = extra.into_iter().map(|(_, name)| name).collect();
        return Err(AppError::remote(format!(
            "Census response for {code} has unexpected column(s): {}",
            names.join(", ")
        )));
    }

    let mut out = Vec::with_capacity(table.len().saturating_sub(1));
    for (idx, row) in table.iter().enumerate().skip(1) {
        check_width(row, &header, idx)?;
        out.push(LabeledValue {
            label: geo.label(row, idx)?,
            value: cell_text(&row[value_idx]),
        });
    }
    Ok(out)
}

fn cell_text(value: &Value) -> Cell {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
