//! File reading utilities

use anyhow::{Context, Result};
use rill_core::BoxStream;
use rill_core::StreamExt;
use rill_segment::chunk_stream;
use std::fs;
use std::path::Path;

/// File reader with UTF-8 validation
pub struct FileReader;

impl FileReader {
    /// Read a file as UTF-8 text
    pub fn read_text(path: &Path) -> Result<String> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read file: {}", path.display()))?;

        Ok(content)
    }

    /// Read a file and replay it as a stream of `chunk_bytes`-sized pieces
    pub fn stream_chunks(path: &Path, chunk_bytes: usize) -> Result<BoxStream<String>> {
        let text = Self::read_text(path)?;
        let chunks = chunk_stream(&text, chunk_bytes)?;
        Ok(chunks.with_log(path.display().to_string()).boxed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rill_core::Stream;
    use std::fs::{self, File};
    use tempfile::TempDir;

    #[test]
    fn test_read_text_success() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("test.txt");

        let content = "Hello, world!\nThis is a test.";
        fs::write(&file_path, content).unwrap();

        let result = FileReader::read_text(&file_path).unwrap();
        assert_eq!(result, content);
    }

    #[test]
    fn test_read_text_nonexistent_file() {
        let path = Path::new("/nonexistent/file.txt");
        let result = FileReader::read_text(path);

        assert!(result.is_err());
        let err_msg = result.unwrap_err().to_string();
        assert!(err_msg.contains("Failed to read file"));
    }

    #[test]
    fn test_stream_chunks() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("utf8.txt");
        fs::write(&file_path, "ab世界cd").unwrap();

        let mut stream = FileReader::stream_chunks(&file_path, 3).unwrap();
        let mut pieces = Vec::new();
        while let Some(piece) = stream.recv().unwrap() {
            pieces.push(piece);
        }
        assert_eq!(pieces, vec!["ab", "世", "界", "cd"]);
    }

    #[test]
    fn test_stream_chunks_rejects_zero() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("empty.txt");
        File::create(&file_path).unwrap();

        assert!(FileReader::stream_chunks(&file_path, 0).is_err());
    }
}
