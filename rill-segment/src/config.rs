//! Pipeline configuration, loaded from TOML
//!
//! ```toml
//! remove_tokens = ["<pad>"]
//! buffered = false
//!
//! [[labels]]
//! name = "think"
//! start_token = "<think>"
//! end_token = "</think>"
//!
//! [throttle]
//! window_ms = 50
//! mode = "pairwise"
//! ```

use crate::chunk::Label;
use crate::error::{Result, SegmentError};
use crate::label::validate_labels;
use crate::special_token::validate_special_tokens;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

const TEMPLATE: &str = r#"# rill segmentation config

# Tokens dropped from the text before segmentation.
remove_tokens = []

# Either labels or special_tokens may be set, not both.
# Reusable markers; text is tagged with the most recent one.
# special_tokens = ["<|user|>", "<|assistant|>"]

# Run the pipeline on a background thread.
buffered = false

# Each label fires once. Without an end_token it runs to the end of the text.
[[labels]]
name = "think"
start_token = "<think>"
end_token = "</think>"

[[labels]]
name = "answer"
start_token = "<answer>"
end_token = "</answer>"

# Merge output chunks that arrive within a time window.
# mode = "pairwise" merges adjacent chunks with the same label;
# mode = "batch" coalesces everything collected in the window.
# [throttle]
# window_ms = 50
# mode = "pairwise"
"#;

/// How the throttle stage merges chunks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThrottleMode {
    /// Join adjacent same-label chunks one pair at a time
    #[default]
    Pairwise,
    /// Coalesce the whole window at once
    Batch,
}

/// Throttle stage settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ThrottleConfig {
    /// Window length in milliseconds
    pub window_ms: u64,
    /// Merge strategy
    #[serde(default)]
    pub mode: ThrottleMode,
}

impl ThrottleConfig {
    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }
}

/// Segmentation pipeline configuration
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SegmentConfig {
    /// Label definitions, in priority order
    #[serde(default)]
    pub labels: Vec<Label>,

    /// Special tokens, in priority order
    #[serde(default)]
    pub special_tokens: Vec<String>,

    /// Tokens removed before segmentation
    #[serde(default)]
    pub remove_tokens: Vec<String>,

    /// Optional throttle stage
    #[serde(default)]
    pub throttle: Option<ThrottleConfig>,

    /// Decouple the pipeline onto a producer thread
    #[serde(default)]
    pub buffered: bool,
}

impl SegmentConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Self::parse(content, "<inline>")
    }

    /// Load and validate a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| SegmentError::ConfigRead {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::parse(&content, &path.display().to_string())
    }

    fn parse(content: &str, origin: &str) -> Result<Self> {
        let config: SegmentConfig =
            toml::from_str(content).map_err(|e| SegmentError::ConfigParse {
                path: origin.to_string(),
                reason: e.to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the configuration describes a buildable pipeline
    pub fn validate(&self) -> Result<()> {
        match (self.labels.is_empty(), self.special_tokens.is_empty()) {
            (false, false) => {
                return Err(SegmentError::InvalidConfig(
                    "labels and special_tokens cannot be combined".to_string(),
                ))
            }
            (false, true) => {
                validate_labels(&self.labels)?;
                let mut seen = HashSet::new();
                if let Some(dup) = self.labels.iter().find(|l| !seen.insert(&l.name)) {
                    return Err(SegmentError::InvalidConfig(format!(
                        "duplicate label name '{}'",
                        dup.name
                    )));
                }
            }
            (true, false) => validate_special_tokens(&self.special_tokens)?,
            (true, true) => {}
        }
        Ok(())
    }

    /// Names the output can be demuxed by: label names or special tokens
    pub fn stream_names(&self) -> Vec<String> {
        if self.labels.is_empty() {
            self.special_tokens.clone()
        } else {
            self.labels.iter().map(|l| l.name.clone()).collect()
        }
    }

    /// A commented starter configuration
    pub fn template() -> &'static str {
        TEMPLATE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_template_is_valid() {
        let config = SegmentConfig::from_toml_str(SegmentConfig::template()).unwrap();
        assert_eq!(config.stream_names(), vec!["think", "answer"]);
        assert!(config.throttle.is_none());
        assert!(!config.buffered);
    }

    #[test]
    fn test_empty_config_is_valid() {
        let config = SegmentConfig::from_toml_str("").unwrap();
        assert_eq!(config, SegmentConfig::default());
    }

    #[test]
    fn test_full_config() {
        let config = SegmentConfig::from_toml_str(
            r#"
remove_tokens = ["<pad>"]
buffered = true

[[labels]]
name = "tail"
start_token = "---"

[throttle]
window_ms = 25
mode = "batch"
"#,
        )
        .unwrap();
        assert_eq!(config.labels, vec![Label::new("tail", "---", "")]);
        assert_eq!(config.remove_tokens, vec!["<pad>"]);
        let throttle = config.throttle.unwrap();
        assert_eq!(throttle.mode, ThrottleMode::Batch);
        assert_eq!(throttle.window(), Duration::from_millis(25));
    }

    #[test]
    fn test_throttle_mode_defaults_to_pairwise() {
        let config = SegmentConfig::from_toml_str("[throttle]\nwindow_ms = 5\n").unwrap();
        assert_eq!(config.throttle.unwrap().mode, ThrottleMode::Pairwise);
    }

    #[test]
    fn test_labels_and_special_tokens_conflict() {
        let err = SegmentConfig::from_toml_str(
            r#"
special_tokens = ["<s>"]

[[labels]]
name = "a"
start_token = "<a>"
"#,
        )
        .unwrap_err();
        assert!(matches!(err, SegmentError::InvalidConfig(_)));
    }

    #[test]
    fn test_duplicate_label_names() {
        let err = SegmentConfig::from_toml_str(
            r#"
[[labels]]
name = "a"
start_token = "<a>"

[[labels]]
name = "a"
start_token = "<b>"
"#,
        )
        .unwrap_err();
        assert_eq!(
            err,
            SegmentError::InvalidConfig("duplicate label name 'a'".to_string())
        );
    }

    #[test]
    fn test_empty_special_token() {
        let err = SegmentConfig::from_toml_str(r#"special_tokens = ["<s>", ""]"#).unwrap_err();
        assert_eq!(err, SegmentError::EmptyToken { index: 1 });
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = SegmentConfig::from_toml_str("lables = []").unwrap_err();
        assert!(matches!(err, SegmentError::ConfigParse { .. }));
    }

    #[test]
    fn test_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "special_tokens = [\"<|end|>\"]").unwrap();
        let config = SegmentConfig::from_file(file.path()).unwrap();
        assert_eq!(config.stream_names(), vec!["<|end|>"]);
    }

    #[test]
    fn test_from_file_nonexistent() {
        let err = SegmentConfig::from_file(Path::new("/nonexistent/rill.toml")).unwrap_err();
        match err {
            SegmentError::ConfigRead { path, .. } => assert_eq!(path, "/nonexistent/rill.toml"),
            other => panic!("expected ConfigRead, got {other:?}"),
        }
    }
}
