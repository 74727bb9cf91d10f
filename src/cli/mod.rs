//! Command-line parsing for the ACS block-group puller.
//!
//! Parsing and dispatch stay separate from the fetch/join code; every flag
//! maps onto a field of `RunConfig`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::{
    DEFAULT_BASE_URL, DEFAULT_BATCH_DIVISOR, DEFAULT_DATASET, DEFAULT_OUTPUT_DIR, DEFAULT_STATE,
    DEFAULT_VARIABLES_PATH, DEFAULT_YEAR, JoinPolicy,
};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "acs", version, about = "ACS block-group puller (Census data API)")]
pub struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch every configured variable for all block groups and write the CSV.
    Pull(PullArgs),
    /// Fetch only the geography reference (GEOID and parts) and write it as CSV.
    Geographies(GeographiesArgs),
    /// Decompose geography labels into GEOID parts (offline).
    Parse(ParseArgs),
    /// Show how a variable map would be chunked (offline).
    Plan(PlanArgs),
}

/// Where and what to query.
#[derive(Debug, Args, Clone)]
pub struct ScopeArgs {
    /// Two-digit state FIPS code.
    #[arg(short, long, default_value = DEFAULT_STATE)]
    pub state: String,

    /// Restrict to one three-digit county FIPS code.
    #[arg(long)]
    pub county: Option<String>,

    /// Survey year.
    #[arg(short, long, default_value_t = DEFAULT_YEAR)]
    pub year: u16,

    /// ACS product (path segment under `/acs/`).
    #[arg(long, default_value = DEFAULT_DATASET)]
    pub dataset: String,

    /// Census data API base URL.
    #[arg(long, default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Output directory.
    #[arg(short, long = "out-dir", default_value = DEFAULT_OUTPUT_DIR)]
    pub out_dir: PathBuf,
}

/// Chunking options.
#[derive(Debug, Args, Clone)]
pub struct BatchArgs {
    /// JSON object of variable code to output column label.
    #[arg(long, value_name = "JSON", default_value = DEFAULT_VARIABLES_PATH)]
    pub variables: PathBuf,

    /// Variables per chunk (overrides --batch-divisor).
    #[arg(long)]
    pub batch_size: Option<usize>,

    /// Chunk size is floor(variable count / divisor) when --batch-size is not given.
    #[arg(long, default_value_t = DEFAULT_BATCH_DIVISOR)]
    pub batch_divisor: usize,
}

#[derive(Debug, Args, Clone)]
pub struct PullArgs {
    #[command(flatten)]
    pub scope: ScopeArgs,

    #[command(flatten)]
    pub batch: BatchArgs,

    /// How variable tables are joined onto the geography reference.
    #[arg(long, value_enum, default_value_t = JoinPolicy::Strict)]
    pub join: JoinPolicy,
}

#[derive(Debug, Args, Clone)]
pub struct GeographiesArgs {
    #[command(flatten)]
    pub scope: ScopeArgs,
}

#[derive(Debug, Args, Clone)]
pub struct ParseArgs {
    /// Labels such as "Summary level: 150, state:37> county:001> tract:000100> block group:1".
    #[arg(required = true)]
    pub labels: Vec<String>,
}

#[derive(Debug, Args, Clone)]
pub struct PlanArgs {
    #[command(flatten)]
    pub batch: BatchArgs,
}
