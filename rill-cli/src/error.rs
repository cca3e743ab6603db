//! Error handling for the CLI application

use std::fmt;

/// Custom error type for CLI-specific errors
#[derive(Debug)]
pub enum CliError {
    /// No file matched the input patterns
    NoInputFiles(Vec<String>),
    /// Invalid file pattern
    InvalidPattern(String),
    /// Chunk size must be at least one byte
    InvalidChunkSize(usize),
    /// Configuration error
    ConfigError(String),
    /// Refusing to replace an existing file
    OutputExists(String),
    /// A demux worker thread panicked
    WorkerPanicked(String),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::NoInputFiles(patterns) => {
                write!(f, "No files found matching: {}", patterns.join(", "))
            }
            CliError::InvalidPattern(pattern) => write!(f, "Invalid file pattern: {pattern}"),
            CliError::InvalidChunkSize(size) => {
                write!(f, "Chunk size must be greater than 0 (got {size})")
            }
            CliError::ConfigError(msg) => write!(f, "Configuration error: {msg}"),
            CliError::OutputExists(path) => {
                write!(f, "Output file already exists: {path} (use --force to overwrite)")
            }
            CliError::WorkerPanicked(label) => write!(f, "Demux worker for '{label}' panicked"),
        }
    }
}

impl std::error::Error for CliError {}

/// Result type alias for CLI operations
pub type CliResult<T> = Result<T, anyhow::Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_input_files_display() {
        let error = CliError::NoInputFiles(vec!["*.txt".to_string(), "a.md".to_string()]);
        assert_eq!(error.to_string(), "No files found matching: *.txt, a.md");
    }

    #[test]
    fn test_invalid_chunk_size_display() {
        let error = CliError::InvalidChunkSize(0);
        assert_eq!(error.to_string(), "Chunk size must be greater than 0 (got 0)");
    }

    #[test]
    fn test_config_error_display() {
        let error = CliError::ConfigError("labels and special_tokens cannot be combined".into());
        assert!(error.to_string().starts_with("Configuration error:"));
    }

    #[test]
    fn test_error_with_special_characters() {
        let error = CliError::InvalidPattern("**[!@#$%^&*()".to_string());
        assert_eq!(error.to_string(), "Invalid file pattern: **[!@#$%^&*()");

        let error = CliError::WorkerPanicked("<|思考|>".to_string());
        assert_eq!(error.to_string(), "Demux worker for '<|思考|>' panicked");
    }

    #[test]
    fn test_downcast_through_anyhow() {
        let result: CliResult<()> = Err(CliError::OutputExists("rill.toml".into()).into());
        let err = result.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CliError>(),
            Some(CliError::OutputExists(path)) if path == "rill.toml"
        ));
    }
}
