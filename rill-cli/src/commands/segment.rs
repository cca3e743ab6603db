//! Segment command implementation

use crate::error::CliError;
use crate::input::{resolve_patterns, FileReader};
use crate::output::{create_formatter, OutputFormat, OutputFormatter};
use crate::progress::ProgressReporter;
use anyhow::{Context, Result};
use clap::Args;
use rill_core::{collect_string, BoxStream, StreamExt};
use rill_segment::{coalesce, segment, segment_demux, LabeledChunk, SegmentConfig};
use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::thread;

/// Arguments for the segment command
#[derive(Debug, Args)]
pub struct SegmentArgs {
    /// Input files or patterns (supports glob)
    #[arg(short, long, value_name = "FILE/PATTERN", required = true)]
    pub input: Vec<String>,

    /// Segmentation config (TOML); without one text passes through unlabeled
    #[arg(short, long, value_name = "FILE", env = "RILL_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output file (default: stdout)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Size of the pieces each file is replayed in, in bytes
    #[arg(long, value_name = "BYTES", default_value_t = 16)]
    pub chunk_bytes: usize,

    /// Drain every label's stream on its own thread and print one block per label
    #[arg(long)]
    pub demux: bool,

    /// Suppress progress output
    #[arg(short, long)]
    pub quiet: bool,

    /// Increase verbosity
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl SegmentArgs {
    /// Execute the segment command
    pub fn execute(&self) -> Result<()> {
        self.init_logging()?;

        log::info!("Starting segmentation");
        log::debug!("Arguments: {:?}", self);

        if self.chunk_bytes == 0 {
            return Err(CliError::InvalidChunkSize(self.chunk_bytes).into());
        }
        let config = self.load_config()?;
        let files = resolve_patterns(&self.input)?;
        log::info!("Found {} file(s) to segment", files.len());

        let writer: Box<dyn Write + Send + Sync> = match &self.output {
            Some(path) => Box::new(BufWriter::new(
                File::create(path)
                    .with_context(|| format!("Failed to create output file: {}", path.display()))?,
            )),
            None => Box::new(io::stdout()),
        };
        let mut formatter = create_formatter(self.format, writer);

        // Progress would interleave with results on stdout.
        let mut progress = ProgressReporter::new(self.quiet || self.output.is_none());
        progress.init_files(files.len() as u64);
        log::debug!("Progress bar active: {}", progress.is_active());

        for path in &files {
            if files.len() > 1 {
                formatter.begin_source(&path.display().to_string())?;
            }
            let count = self.segment_file(path, &config, formatter.as_mut())?;
            log::info!("{}: {} chunk(s)", path.display(), count);
            progress.file_completed(&path.display().to_string(), count);
        }

        formatter.finish()?;
        progress.finish();
        Ok(())
    }

    fn load_config(&self) -> Result<SegmentConfig> {
        match &self.config {
            Some(path) => {
                log::info!("Loading config from {}", path.display());
                SegmentConfig::from_file(path).map_err(|e| CliError::ConfigError(e.to_string()).into())
            }
            None => Ok(SegmentConfig::default()),
        }
    }

    fn segment_file(
        &self,
        path: &Path,
        config: &SegmentConfig,
        formatter: &mut dyn OutputFormatter,
    ) -> Result<usize> {
        let src = FileReader::stream_chunks(path, self.chunk_bytes)?;
        let chunks = if self.demux {
            let split = segment_demux(src, config)?;
            drain_demux(split, &config.stream_names())?
        } else {
            let chunks = segment(src, config)?
                .try_collect()
                .with_context(|| format!("Segmentation failed for {}", path.display()))?;
            coalesce(chunks)
        };
        for chunk in &chunks {
            formatter.format_chunk(chunk)?;
        }
        Ok(chunks.len())
    }

    /// Initialize logging based on verbosity level
    fn init_logging(&self) -> Result<()> {
        let log_level = match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        };

        if !self.quiet {
            // A second init (e.g. from tests) is harmless.
            let _ = env_logger::Builder::from_env(
                env_logger::Env::default().default_filter_or(log_level),
            )
            .try_init();
        }

        Ok(())
    }
}

/// Collect every per-label stream on its own thread.
///
/// Returns one chunk per stream, unlabeled text first, then `names` in order.
/// Streams that received no text are left out.
fn drain_demux(
    mut split: HashMap<String, BoxStream<String>>,
    names: &[String],
) -> Result<Vec<LabeledChunk>> {
    let order: Vec<String> = std::iter::once(String::new())
        .chain(names.iter().cloned())
        .collect();

    let mut workers = Vec::with_capacity(order.len());
    for name in &order {
        let Some(stream) = split.remove(name) else {
            continue;
        };
        let handle = thread::Builder::new()
            .name(format!("rill-demux-{}", workers.len()))
            .spawn(move || collect_string(stream))
            .context("Failed to spawn demux worker")?;
        workers.push((name.clone(), handle));
    }

    let mut chunks = Vec::with_capacity(workers.len());
    for (name, handle) in workers {
        let text = handle
            .join()
            .map_err(|_| CliError::WorkerPanicked(name.clone()))?
            .with_context(|| format!("Stream for label '{name}' failed"))?;
        if !text.is_empty() {
            chunks.push(LabeledChunk::new(name, text));
        }
    }
    Ok(chunks)
}
