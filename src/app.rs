//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - sets up logging
//! - resolves a `RunConfig`
//! - runs the pull pipeline and prints a summary

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{BatchArgs, Command, GeographiesArgs, ParseArgs, PlanArgs, PullArgs, ScopeArgs};
use crate::data::{CensusClient, chunk_size};
use crate::domain::RunConfig;
use crate::error::AppError;
use crate::geoid::parse_label;

pub mod pipeline;

/// Entry point for the `acs` binary.
pub fn run() -> Result<(), AppError> {
    let cli = crate::cli::Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Pull(args) => handle_pull(args),
        Command::Geographies(args) => handle_geographies(args),
        Command::Parse(args) => handle_parse(args),
        Command::Plan(args) => handle_plan(args),
    }
}

/// Logs go to stderr; stdout carries the report.
fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .ok();
}

fn handle_pull(args: PullArgs) -> Result<(), AppError> {
    let mut config = pull_config_from_args(&args);
    config.api_key = CensusClient::api_key_from_env();

    let output = pipeline::run_pull(&config)?;
    let path = pipeline::write_outputs(&config, &output)?;

    println!("{}", crate::report::format_run_summary(&config, &output, &path));
    Ok(())
}

fn handle_geographies(args: GeographiesArgs) -> Result<(), AppError> {
    let mut config = RunConfig::default();
    apply_scope(&mut config, &args.scope);
    config.validate()?;

    let client = CensusClient::new(config.base_url.clone(), CensusClient::api_key_from_env());
    let reference = pipeline::fetch_reference(&client, &config.scope())?;
    let path = config.reference_path();
    crate::io::write_reference_csv(&path, &reference)?;

    println!("{}", crate::report::format_reference_summary(&reference, &path));
    Ok(())
}

fn handle_parse(args: ParseArgs) -> Result<(), AppError> {
    let mut failed = 0usize;
    for label in &args.labels {
        let result = parse_label(label);
        if result.is_err() {
            failed += 1;
        }
        println!("{}", crate::report::format_parsed_label(label, &result));
    }
    if failed > 0 {
        return Err(AppError::shape(format!(
            "{failed} of {} label(s) did not decompose into a block group.",
            args.labels.len()
        )));
    }
    Ok(())
}

fn handle_plan(args: PlanArgs) -> Result<(), AppError> {
    let mut config = RunConfig::default();
    apply_batch(&mut config, &args.batch);
    config.validate()?;

    let map = crate::io::load_variable_map(&config.variables_path)?;
    let size = chunk_size(map.len(), config.batch_size, config.batch_divisor);
    println!("{}", crate::report::format_chunk_plan(&map, size));
    Ok(())
}

pub fn pull_config_from_args(args: &PullArgs) -> RunConfig {
    let mut config = RunConfig {
        join: args.join,
        ..RunConfig::default()
    };
    apply_scope(&mut config, &args.scope);
    apply_batch(&mut config, &args.batch);
    config
}

fn apply_scope(config: &mut RunConfig, scope: &ScopeArgs) {
    config.state = scope.state.trim().to_string();
    config.county = scope.county.as_deref().map(str::trim).map(str::to_string);
    config.year = scope.year;
    config.dataset = scope.dataset.trim().to_string();
    config.base_url = scope.base_url.clone();
    config.output_dir = scope.out_dir.clone();
}

fn apply_batch(config: &mut RunConfig, batch: &BatchArgs) {
    config.variables_path = batch.variables.clone();
    config.batch_size = batch.batch_size;
    config.batch_divisor = batch.batch_divisor;
}
