//! Validate command implementation

use anyhow::Result;
use clap::Args;
use rill_segment::SegmentConfig;
use std::path::PathBuf;

/// Arguments for the validate command
#[derive(Debug, Args)]
pub struct ValidateArgs {
    /// Path to the segmentation config to validate
    #[arg(short, long, value_name = "FILE", required = true)]
    pub config: PathBuf,
}

impl ValidateArgs {
    /// Execute the validate command
    pub fn execute(&self) -> Result<()> {
        println!("Validating segmentation config: {}", self.config.display());

        match SegmentConfig::from_file(&self.config) {
            Ok(config) => {
                println!("✓ Configuration is valid!");
                println!("{}", summarize(&config));
                Ok(())
            }
            Err(e) => {
                println!("✗ Configuration is invalid!");
                println!("  Error: {e}");
                Err(anyhow::anyhow!("Validation failed: {}", e))
            }
        }
    }
}

fn summarize(config: &SegmentConfig) -> String {
    let mut lines = Vec::new();
    if config.labels.is_empty() && config.special_tokens.is_empty() {
        lines.push("  Engine: none (text passes through unlabeled)".to_string());
    } else if config.labels.is_empty() {
        lines.push(format!(
            "  Special tokens: {}",
            config.special_tokens.join(", ")
        ));
    } else {
        lines.push(format!("  Labels: {}", config.labels.len()));
        for label in &config.labels {
            let end = if label.is_unbounded() {
                "(end of stream)"
            } else {
                label.end_token.as_str()
            };
            lines.push(format!("    {}: {:?} .. {}", label.name, label.start_token, end));
        }
    }
    if !config.remove_tokens.is_empty() {
        lines.push(format!("  Removed tokens: {}", config.remove_tokens.join(", ")));
    }
    if let Some(throttle) = &config.throttle {
        lines.push(format!(
            "  Throttle: {:?} every {} ms",
            throttle.mode, throttle.window_ms
        ));
    }
    lines.push(format!("  Buffered: {}", config.buffered));
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn config_file(content: &str) -> NamedTempFile {
        let mut temp_file = NamedTempFile::new().unwrap();
        write!(temp_file, "{}", content).unwrap();
        temp_file
    }

    #[test]
    fn test_validate_valid_config() {
        let file = config_file(
            r#"
[[labels]]
name = "think"
start_token = "<think>"
end_token = "</think>"
"#,
        );
        let args = ValidateArgs {
            config: file.path().to_path_buf(),
        };
        assert!(args.execute().is_ok());
    }

    #[test]
    fn test_validate_invalid_config() {
        let file = config_file(
            r#"
special_tokens = ["<s>"]

[[labels]]
name = "think"
start_token = "<think>"
"#,
        );
        let args = ValidateArgs {
            config: file.path().to_path_buf(),
        };
        assert!(args.execute().is_err());
    }

    #[test]
    fn test_summary() {
        let config = SegmentConfig::from_toml_str(
            r#"
remove_tokens = ["<pad>"]

[[labels]]
name = "tail"
start_token = "---"

[throttle]
window_ms = 20
mode = "batch"
"#,
        )
        .unwrap();
        let summary = summarize(&config);
        assert!(summary.contains("Labels: 1"));
        assert!(summary.contains("tail: \"---\" .. (end of stream)"));
        assert!(summary.contains("Removed tokens: <pad>"));
        assert!(summary.contains("Throttle: Batch every 20 ms"));
    }
}
