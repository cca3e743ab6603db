//! JSON output formatter

use super::OutputFormatter;
use anyhow::Result;
use rill_segment::LabeledChunk;
use serde::{Deserialize, Serialize};
use std::io::Write;

/// JSON formatter - outputs chunks as one JSON array
pub struct JsonFormatter<W: Write> {
    writer: W,
    source: Option<String>,
    records: Vec<ChunkRecord>,
}

/// Data structure for JSON output
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChunkRecord {
    /// Input file the chunk came from, when several were given
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub source: Option<String>,
    /// Label name, `""` for unlabeled text
    pub label: String,
    /// Chunk text, `""` for a marker
    pub chunk: String,
}

impl<W: Write> JsonFormatter<W> {
    /// Create a new JSON formatter
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            source: None,
            records: Vec::new(),
        }
    }

    /// Consume the formatter and return its writer
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write + Send + Sync> OutputFormatter for JsonFormatter<W> {
    fn begin_source(&mut self, name: &str) -> Result<()> {
        self.source = Some(name.to_string());
        Ok(())
    }

    fn format_chunk(&mut self, chunk: &LabeledChunk) -> Result<()> {
        self.records.push(ChunkRecord {
            source: self.source.clone(),
            label: chunk.label.clone(),
            chunk: chunk.chunk.clone(),
        });
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        serde_json::to_writer_pretty(&mut self.writer, &self.records)?;
        writeln!(self.writer)?;
        self.writer.flush()?;
        Ok(())
    }
}
