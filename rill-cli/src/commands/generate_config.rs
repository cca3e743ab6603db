//! Generate config command implementation

use crate::error::CliError;
use anyhow::{Context, Result};
use clap::Args;
use rill_segment::SegmentConfig;
use std::path::PathBuf;

/// Arguments for the generate-config command
#[derive(Debug, Args)]
pub struct GenerateConfigArgs {
    /// Output file path
    #[arg(short, long, value_name = "FILE", required = true)]
    pub output: PathBuf,

    /// Overwrite the output file if it exists
    #[arg(long)]
    pub force: bool,
}

impl GenerateConfigArgs {
    /// Execute the generate-config command
    pub fn execute(&self) -> Result<()> {
        if self.output.exists() && !self.force {
            return Err(CliError::OutputExists(self.output.display().to_string()).into());
        }

        println!("Generating segmentation config template...");
        println!("  Output file: {}", self.output.display());

        std::fs::write(&self.output, SegmentConfig::template())
            .with_context(|| format!("Failed to write to {}", self.output.display()))?;

        println!("✓ Configuration template generated successfully!");
        println!();
        println!("Next steps:");
        println!("1. Edit the labels or special tokens");
        println!("2. Validate your configuration:");
        println!("   rill validate -c {}", self.output.display());
        println!("3. Use it for segmentation:");
        println!("   rill segment -i input.txt -c {}", self.output.display());

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_generated_template_loads() {
        let temp_dir = TempDir::new().unwrap();
        let output = temp_dir.path().join("rill.toml");
        let args = GenerateConfigArgs {
            output: output.clone(),
            force: false,
        };
        args.execute().unwrap();

        let config = SegmentConfig::from_file(&output).unwrap();
        assert_eq!(config.labels.len(), 2);
    }

    #[test]
    fn test_refuses_to_overwrite() {
        let temp_dir = TempDir::new().unwrap();
        let output = temp_dir.path().join("rill.toml");
        fs::write(&output, "keep me").unwrap();

        let args = GenerateConfigArgs {
            output: output.clone(),
            force: false,
        };
        assert!(args.execute().is_err());
        assert_eq!(fs::read_to_string(&output).unwrap(), "keep me");

        let forced = GenerateConfigArgs {
            output: output.clone(),
            force: true,
        };
        forced.execute().unwrap();
        assert_eq!(fs::read_to_string(&output).unwrap(), SegmentConfig::template());
    }
}
