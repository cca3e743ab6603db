//! rill CLI library
//!
//! This library provides the command-line interface for segmenting text
//! files through a rill pipeline, replaying each file as a chunked stream.

pub mod commands;
pub mod error;
pub mod input;
pub mod output;
pub mod progress;

pub use error::{CliError, CliResult};
