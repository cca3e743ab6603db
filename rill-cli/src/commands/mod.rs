//! CLI command implementations

use anyhow::Result;
use clap::Subcommand;

pub mod generate_config;
pub mod segment;
pub mod validate;

/// Available CLI commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Segment text files through a configured pipeline
    Segment(segment::SegmentArgs),

    /// Check a segmentation config
    Validate(validate::ValidateArgs),

    /// Write a commented config template
    GenerateConfig(generate_config::GenerateConfigArgs),
}

impl Commands {
    /// Run the selected command
    pub fn execute(&self) -> Result<()> {
        match self {
            Commands::Segment(args) => args.execute(),
            Commands::Validate(args) => args.execute(),
            Commands::GenerateConfig(args) => args.execute(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::OutputFormat;
    use std::path::PathBuf;

    #[test]
    fn test_commands_debug_format() {
        let segment_cmd = Commands::Segment(segment::SegmentArgs {
            input: vec!["test.txt".to_string()],
            config: None,
            output: None,
            format: OutputFormat::Text,
            chunk_bytes: 16,
            demux: false,
            quiet: false,
            verbose: 0,
        });

        let debug_str = format!("{:?}", segment_cmd);
        assert!(debug_str.contains("Segment"));
        assert!(debug_str.contains("test.txt"));

        let validate_cmd = Commands::Validate(validate::ValidateArgs {
            config: PathBuf::from("rill.toml"),
        });
        assert!(format!("{:?}", validate_cmd).contains("rill.toml"));
    }
}
