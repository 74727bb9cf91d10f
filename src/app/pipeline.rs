//! Shared pull pipeline used by the CLI subcommands.
//!
//! variable map -> geography reference -> chunked variable fetch -> GEOID join
//!
//! The remote side is a `CensusSource`, so the whole pipeline runs offline in
//! tests against canned responses.

use std::path::PathBuf;

use tracing::info;

use crate::data::{CensusClient, CensusSource, ChunkedVariableFetcher, chunk_size, plan_chunks};
use crate::domain::{RunConfig, Scope, VariableMap};
use crate::error::AppError;
use crate::geoid::{ReferenceTable, build_reference};
use crate::io::{RunManifest, load_variable_map, write_manifest_json, write_wide_csv};
use crate::table::{WideTable, assemble};

/// All computed outputs of a single `acs pull` run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub variables: VariableMap,
    pub reference: ReferenceTable,
    pub table: WideTable,
    pub chunk_size: usize,
    pub chunk_count: usize,
}

/// Execute the full pull against the Census API.
///
/// The variable map is loaded and validated before any request is made.
pub fn run_pull(config: &RunConfig) -> Result<RunOutput, AppError> {
    config.validate()?;
    let variables = load_variable_map(&config.variables_path)?;
    info!(
        variables = variables.len(),
        path = %config.variables_path.display(),
        "loaded variable map"
    );

    let client = CensusClient::new(config.base_url.clone(), config.api_key.clone());
    run_pull_with_source(config, &variables, &client)
}

/// Execute the pull with an already loaded variable map and any source.
pub fn run_pull_with_source<S: CensusSource + ?Sized>(
    config: &RunConfig,
    variables: &VariableMap,
    source: &S,
) -> Result<RunOutput, AppError> {
    let scope = config.scope();

    let reference = fetch_reference(source, &scope)?;

    let fetcher = ChunkedVariableFetcher::new(
        source,
        chunk_size(variables.len(), config.batch_size, config.batch_divisor),
    );
    let chunk_count = plan_chunks(variables, fetcher.chunk_size()).len();
    let tables = fetcher.fetch_all(&scope, variables)?;

    let table = assemble(&reference, &tables, config.join)?;

    Ok(RunOutput {
        variables: variables.clone(),
        reference,
        table,
        chunk_size: fetcher.chunk_size(),
        chunk_count,
    })
}

/// Enumerate block groups in scope and build the reference table.
pub fn fetch_reference<S: CensusSource + ?Sized>(
    source: &S,
    scope: &Scope,
) -> Result<ReferenceTable, AppError> {
    let labels = source.geographies(scope)?;
    if labels.is_empty() {
        return Err(AppError::remote(format!(
            "No block groups returned for state {} ({} {}).",
            scope.state, scope.dataset, scope.year
        )));
    }
    let reference = build_reference(&labels)?;
    info!(rows = reference.len(), state = %scope.state, "built geography reference");
    Ok(reference)
}

/// Write the result CSV and its manifest; returns the CSV path.
pub fn write_outputs(config: &RunConfig, output: &RunOutput) -> Result<PathBuf, AppError> {
    let path = config.output_path();
    write_wide_csv(&path, &output.table)?;

    let manifest = RunManifest::new(
        config,
        output.chunk_size,
        output.chunk_count,
        output.reference.len(),
        &output.table,
        &path,
    );
    write_manifest_json(&config.manifest_path(), &manifest)?;

    Ok(path)
}
