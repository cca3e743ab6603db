//! Labeled output and label definitions

use serde::{Deserialize, Serialize};

/// A piece of text tagged with the label it belongs to.
///
/// `label` is empty for unlabeled text. `chunk` is empty only for bare
/// marker events from the special-token engine.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LabeledChunk {
    /// Label name, or `""` for unlabeled text
    pub label: String,
    /// Text content
    pub chunk: String,
}

impl LabeledChunk {
    /// Create a labeled chunk
    pub fn new(label: impl Into<String>, chunk: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            chunk: chunk.into(),
        }
    }

    /// Whether this is a bare marker with no text
    pub fn is_marker(&self) -> bool {
        self.chunk.is_empty()
    }

    /// Join two chunks with the same label.
    ///
    /// Markers never merge, so every marker event survives.
    pub fn merge(&self, next: &LabeledChunk) -> Option<LabeledChunk> {
        if self.label != next.label || self.is_marker() || next.is_marker() {
            return None;
        }
        let mut chunk = String::with_capacity(self.chunk.len() + next.chunk.len());
        chunk.push_str(&self.chunk);
        chunk.push_str(&next.chunk);
        Some(LabeledChunk {
            label: self.label.clone(),
            chunk,
        })
    }
}

/// Join adjacent same-label chunks, keeping markers separate
pub fn coalesce(chunks: Vec<LabeledChunk>) -> Vec<LabeledChunk> {
    let mut out: Vec<LabeledChunk> = Vec::with_capacity(chunks.len());
    for chunk in chunks {
        match out.last_mut() {
            Some(last) if last.label == chunk.label && !last.is_marker() && !chunk.is_marker() => {
                last.chunk.push_str(&chunk.chunk);
            }
            _ => out.push(chunk),
        }
    }
    out
}

/// A labeled region delimited by a start token and an optional end token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    /// Name reported on every chunk inside the region
    pub name: String,
    /// Token that opens the region; never emitted
    #[serde(default)]
    pub start_token: String,
    /// Token that closes the region; empty means the region runs to the end
    /// of the stream
    #[serde(default)]
    pub end_token: String,
}

impl Label {
    /// Create a label
    pub fn new(
        name: impl Into<String>,
        start_token: impl Into<String>,
        end_token: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            start_token: start_token.into(),
            end_token: end_token.into(),
        }
    }

    /// Whether the region extends to the end of the stream
    pub fn is_unbounded(&self) -> bool {
        self.end_token.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_same_label() {
        let a = LabeledChunk::new("x", "ab");
        let b = LabeledChunk::new("x", "cd");
        assert_eq!(a.merge(&b), Some(LabeledChunk::new("x", "abcd")));
        assert_eq!(a.merge(&LabeledChunk::new("y", "cd")), None);
    }

    #[test]
    fn test_markers_never_merge() {
        let marker = LabeledChunk::new("<|end|>", "");
        let text = LabeledChunk::new("<|end|>", "tail");
        assert_eq!(marker.merge(&text), None);
        assert_eq!(text.merge(&marker), None);
    }

    #[test]
    fn test_coalesce() {
        let chunks = vec![
            LabeledChunk::new("", "he"),
            LabeledChunk::new("", "llo"),
            LabeledChunk::new("t", ""),
            LabeledChunk::new("t", "wor"),
            LabeledChunk::new("t", "ld"),
        ];
        assert_eq!(
            coalesce(chunks),
            vec![
                LabeledChunk::new("", "hello"),
                LabeledChunk::new("t", ""),
                LabeledChunk::new("t", "world"),
            ]
        );
    }

    #[test]
    fn test_label_deserializes_with_defaults() {
        let label: Label = toml::from_str("name = \"tail\"\nstart_token = \"<tail>\"").unwrap();
        assert!(label.is_unbounded());
        assert_eq!(label.start_token, "<tail>");
    }
}
