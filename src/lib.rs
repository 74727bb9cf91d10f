//! `acs-pull` library crate.
//!
//! The binary (`acs`) is a thin wrapper around this library so that the GEOID
//! parsing, chunked fetch and join are testable without spawning processes or
//! touching the network.

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod geoid;
pub mod io;
pub mod report;
pub mod table;
