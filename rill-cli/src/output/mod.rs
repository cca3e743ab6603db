//! Output formatting module

use anyhow::Result;
use clap::ValueEnum;
use rill_segment::LabeledChunk;
use std::io::Write;

/// Trait for output formatters
pub trait OutputFormatter: Send + Sync {
    /// Start the output of a new input file
    fn begin_source(&mut self, name: &str) -> Result<()>;

    /// Format and output a single labeled chunk
    fn format_chunk(&mut self, chunk: &LabeledChunk) -> Result<()>;

    /// Finalize output (e.g., close JSON array)
    fn finish(&mut self) -> Result<()>;
}

pub mod json;
pub mod markdown;
pub mod text;

pub use json::JsonFormatter;
pub use markdown::MarkdownFormatter;
pub use text::TextFormatter;

/// Supported output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One `[label] chunk` line per chunk
    Text,
    /// JSON array of `{label, chunk}` records
    Json,
    /// One markdown section per label run
    Markdown,
}

/// Build the formatter for `format` over `writer`
pub fn create_formatter<W>(format: OutputFormat, writer: W) -> Box<dyn OutputFormatter>
where
    W: Write + Send + Sync + 'static,
{
    match format {
        OutputFormat::Text => Box::new(TextFormatter::new(writer)),
        OutputFormat::Json => Box::new(JsonFormatter::new(writer)),
        OutputFormat::Markdown => Box::new(MarkdownFormatter::new(writer)),
    }
}
