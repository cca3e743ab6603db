//! Markdown output formatter

use super::OutputFormatter;
use anyhow::Result;
use rill_segment::LabeledChunk;
use std::io::Write;

/// Markdown formatter - one section per label run
pub struct MarkdownFormatter<W: Write> {
    writer: W,
    chunk_count: usize,
}

impl<W: Write> MarkdownFormatter<W> {
    /// Create a new markdown formatter
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            chunk_count: 0,
        }
    }

    /// Consume the formatter and return its writer
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write + Send + Sync> OutputFormatter for MarkdownFormatter<W> {
    fn begin_source(&mut self, name: &str) -> Result<()> {
        writeln!(self.writer, "# {name}")?;
        writeln!(self.writer)?;
        Ok(())
    }

    fn format_chunk(&mut self, chunk: &LabeledChunk) -> Result<()> {
        self.chunk_count += 1;
        if chunk.is_marker() {
            writeln!(self.writer, "> marker `{}`", chunk.label)?;
            writeln!(self.writer)?;
            return Ok(());
        }
        let heading = if chunk.label.is_empty() {
            "(unlabeled)"
        } else {
            chunk.label.as_str()
        };
        writeln!(self.writer, "## {heading}")?;
        writeln!(self.writer)?;
        writeln!(self.writer, "{}", chunk.chunk)?;
        writeln!(self.writer)?;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        writeln!(self.writer, "---")?;
        writeln!(self.writer, "*Total chunks: {}*", self.chunk_count)?;
        self.writer.flush()?;
        Ok(())
    }
}
