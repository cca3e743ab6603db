//! Plain text output formatter

use super::OutputFormatter;
use anyhow::Result;
use rill_segment::LabeledChunk;
use std::io::Write;

/// Plain text formatter - one `[label] chunk` line per chunk
///
/// Unlabeled text is written without a prefix; special-token markers appear
/// as a bare `[token]`.
pub struct TextFormatter<W: Write> {
    writer: W,
}

impl<W: Write> TextFormatter<W> {
    /// Create a new text formatter
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Consume the formatter and return its writer
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write + Send + Sync> OutputFormatter for TextFormatter<W> {
    fn begin_source(&mut self, name: &str) -> Result<()> {
        writeln!(self.writer, "==> {name} <==")?;
        Ok(())
    }

    fn format_chunk(&mut self, chunk: &LabeledChunk) -> Result<()> {
        match (chunk.label.is_empty(), chunk.is_marker()) {
            (true, _) => writeln!(self.writer, "{}", chunk.chunk)?,
            (false, true) => writeln!(self.writer, "[{}]", chunk.label)?,
            (false, false) => writeln!(self.writer, "[{}] {}", chunk.label, chunk.chunk)?,
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}
