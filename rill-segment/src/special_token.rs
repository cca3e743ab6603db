//! Special-token engine: reusable markers that retag the text after them
//!
//! Each occurrence of a token produces a bare marker
//! `LabeledChunk { label: token, chunk: "" }`. Text is tagged with the most
//! recent token seen, or `""` before the first one.

use crate::chunk::LabeledChunk;
use crate::engine::{CutPolicy, Segmenter};
use crate::error::{Result, SegmentError};
use crate::label::split_text;
use crate::residual::{max_char_len, ResidualBuffer, Search};
use rill_core::{BoxStream, Stream};
use std::collections::HashMap;
use std::fmt;
use tracing::trace;

/// Check a token list for use with [`SpecialTokenStream`]
pub fn validate_special_tokens(tokens: &[String]) -> Result<()> {
    if tokens.is_empty() {
        return Err(SegmentError::EmptyTokenSet);
    }
    if let Some(index) = tokens.iter().position(String::is_empty) {
        return Err(SegmentError::EmptyToken { index });
    }
    Ok(())
}

/// Cut policy of [`SpecialTokenStream`]
#[derive(Debug, Clone)]
pub struct SpecialTokenPolicy {
    tokens: Vec<String>,
    last: String,
}

impl SpecialTokenPolicy {
    /// The most recent token seen
    pub fn last_token(&self) -> &str {
        &self.last
    }
}

impl CutPolicy for SpecialTokenPolicy {
    type Output = LabeledChunk;

    fn cut(&mut self, buf: &mut ResidualBuffer) -> Option<LabeledChunk> {
        if !buf.is_overflowing() {
            return None;
        }
        let candidates: Vec<&str> = self.tokens.iter().map(String::as_str).collect();
        match buf.search(&candidates) {
            Search::Pending => None,
            Search::NotFound => {
                let text = buf.release_overflow()?;
                Some(LabeledChunk::new(self.last.clone(), text))
            }
            Search::Found { index, offset: 0 } => {
                let token = &self.tokens[index];
                buf.skip(token.len());
                trace!(token = %token, "special token");
                self.last.clone_from(token);
                Some(LabeledChunk::new(token.clone(), ""))
            }
            // The token stays buffered and becomes the marker on the next cut.
            Search::Found { offset, .. } => {
                let text = buf.split_off_front(offset);
                Some(LabeledChunk::new(self.last.clone(), text))
            }
        }
    }
}

/// Special-token engine over a stream of text chunks
pub struct SpecialTokenStream<S> {
    inner: Segmenter<S, SpecialTokenPolicy>,
}

impl<S> fmt::Debug for SpecialTokenStream<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpecialTokenStream")
            .field("inner", &self.inner)
            .finish()
    }
}

impl<S> SpecialTokenStream<S>
where
    S: Stream<Item = String>,
{
    /// Build a special-token engine; on overlapping matches at one offset the
    /// token listed first wins
    pub fn new(src: S, tokens: Vec<String>) -> Result<Self> {
        validate_special_tokens(&tokens)?;
        let min_len = max_char_len(tokens.iter().map(String::as_str));
        let policy = SpecialTokenPolicy {
            tokens,
            last: String::new(),
        };
        Ok(Self {
            inner: Segmenter::new(src, policy, min_len),
        })
    }

    pub fn tokens(&self) -> &[String] {
        &self.inner.policy().tokens
    }

    /// Split into one text stream per token, plus `""` for text before the
    /// first token.
    ///
    /// Every marker shows up as an empty string in its token's stream. Every
    /// returned stream must be drained, or all of them dropped.
    pub fn demux(self) -> HashMap<String, BoxStream<String>>
    where
        S: Send + 'static,
    {
        let names = self.tokens().to_vec();
        split_text(self, &names)
    }
}

impl<S> Stream for SpecialTokenStream<S>
where
    S: Stream<Item = String>,
{
    type Item = LabeledChunk;

    fn recv(&mut self) -> rill_core::Result<Option<LabeledChunk>> {
        self.inner.recv()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rill_core::{collect_string, from_iter, StreamError, StreamExt};

    fn pieces(v: &[&str]) -> impl Stream<Item = String> + Send + 'static {
        from_iter(v.iter().map(|s| s.to_string()).collect::<Vec<_>>())
    }

    fn tokens(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    fn run(input: &[&str], toks: &[&str]) -> Vec<LabeledChunk> {
        SpecialTokenStream::new(pieces(input), tokens(toks))
            .unwrap()
            .try_collect()
            .unwrap()
    }

    #[test]
    fn test_single_token_in_one_chunk() {
        assert_eq!(
            run(&["hello<|end|>world"], &["<|end|>"]),
            vec![
                LabeledChunk::new("", "hello"),
                LabeledChunk::new("<|end|>", ""),
                LabeledChunk::new("<|end|>", "world"),
            ]
        );
    }

    #[test]
    fn test_token_split_across_chunks() {
        assert_eq!(
            run(&["hello<|", "end|>world"], &["<|end|>"]),
            vec![
                LabeledChunk::new("", "hello"),
                LabeledChunk::new("<|end|>", ""),
                LabeledChunk::new("<|end|>", "world"),
            ]
        );
    }

    #[test]
    fn test_multiple_tokens() {
        assert_eq!(
            run(&["a<|mid|>b<|end|>c"], &["<|mid|>", "<|end|>"]),
            vec![
                LabeledChunk::new("", "a"),
                LabeledChunk::new("<|mid|>", ""),
                LabeledChunk::new("<|mid|>", "b"),
                LabeledChunk::new("<|end|>", ""),
                LabeledChunk::new("<|end|>", "c"),
            ]
        );
    }

    #[test]
    fn test_only_a_token() {
        assert_eq!(
            run(&["<|end|>"], &["<|end|>"]),
            vec![LabeledChunk::new("<|end|>", "")]
        );
    }

    #[test]
    fn test_empty_input() {
        assert!(run(&[], &["<|end|>"]).is_empty());
    }

    #[test]
    fn test_tokens_are_reusable() {
        let out = run(&["x<br>y<br>z"], &["<br>"]);
        let markers = out.iter().filter(|c| c.is_marker()).count();
        assert_eq!(markers, 2);
        assert_eq!(out.last(), Some(&LabeledChunk::new("<br>", "z")));
    }

    #[test]
    fn test_no_token_is_plain_text() {
        let out = run(&["hello", "world"], &["<|end|>"]);
        assert!(out.iter().all(|c| c.label.is_empty()));
        let text: String = out.into_iter().map(|c| c.chunk).collect();
        assert_eq!(text, "helloworld");
    }

    #[test]
    fn test_rejects_empty_tokens() {
        assert_eq!(
            SpecialTokenStream::new(pieces(&[]), vec![]).unwrap_err(),
            SegmentError::EmptyTokenSet
        );
        assert_eq!(
            SpecialTokenStream::new(pieces(&[]), tokens(&["<a>", ""])).unwrap_err(),
            SegmentError::EmptyToken { index: 1 }
        );
    }

    #[test]
    fn test_upstream_error_discards_residual() {
        let mut calls = 0;
        let src = rill_core::from_fn(move || {
            calls += 1;
            match calls {
                1 => Ok(Some("abc".to_string())),
                _ => Err(StreamError::msg("disconnected")),
            }
        });
        let mut s = SpecialTokenStream::new(src, tokens(&["<|long-token|>"])).unwrap();
        assert_eq!(s.recv().unwrap_err().to_string(), "disconnected");
        assert_eq!(s.recv().unwrap_err().to_string(), "disconnected");
    }

    #[test]
    fn test_demux_by_token() {
        let stream = SpecialTokenStream::new(
            pieces(&["intro<think>reasoning<answer>", "final"]),
            tokens(&["<think>", "<answer>"]),
        )
        .unwrap();
        let mut split = stream.demux();
        assert_eq!(collect_string(split.remove("").unwrap()).unwrap(), "intro");
        assert_eq!(collect_string(split.remove("<think>").unwrap()).unwrap(), "reasoning");
        assert_eq!(collect_string(split.remove("<answer>").unwrap()).unwrap(), "final");
    }
}
