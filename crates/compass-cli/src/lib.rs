//! compass CLI crate
//!
//! Commands (see [commands]):
//! - init: write the default experiment as TOML
//! - inspect: build the circuit from the experiment and print its topology,
//!   applied overlap overrides and data warnings
//! - run: simulate with a progress bar and store the spike raster as a
//!   checksummed archive, optionally with voltage traces as JSON
//! - summary: read an archive back and print per-cluster firing
//!
//! The binary (src/main.rs) wires up logging and argument parsing, then calls
//! [`CompassCli::execute`]. The command modules are exposed as a library so
//! tests can drive them without spawning a process.

pub mod commands;
pub mod error;

pub use commands::CompassCli;
pub use error::{CliError, CliResult};
