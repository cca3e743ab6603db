//! Remove-token engine: drop every occurrence of a set of tokens
//!
//! The earliest occurrence is removed first; at one offset the token listed
//! first wins. Text that becomes adjacent after a removal is not scanned again,
//! so `["bc", "ad"]` over `"abcd"` yields `"ad"`.

use crate::engine::{CutPolicy, Segmenter};
use crate::residual::{max_char_len, ResidualBuffer, Search};
use rill_core::{Result, Stream};
use std::fmt;

/// Cut policy of [`RemoveTokens`]
#[derive(Debug, Clone)]
pub struct RemovePolicy {
    tokens: Vec<String>,
}

impl CutPolicy for RemovePolicy {
    type Output = String;

    fn cut(&mut self, buf: &mut ResidualBuffer) -> Option<String> {
        loop {
            if !buf.is_overflowing() {
                return None;
            }
            let candidates: Vec<&str> = self.tokens.iter().map(String::as_str).collect();
            match buf.search(&candidates) {
                Search::Pending => return None,
                Search::NotFound => return buf.release_overflow(),
                Search::Found { index, offset } => {
                    let text = buf.split_off_front(offset);
                    buf.skip(self.tokens[index].len());
                    if !text.is_empty() {
                        return Some(text);
                    }
                }
            }
        }
    }
}

enum Inner<S> {
    Passthrough(S),
    Filtering(Segmenter<S, RemovePolicy>),
}

/// Stream with a set of tokens removed from its text
pub struct RemoveTokens<S> {
    inner: Inner<S>,
}

impl<S> fmt::Debug for RemoveTokens<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.inner {
            Inner::Passthrough(_) => f.write_str("RemoveTokens(passthrough)"),
            Inner::Filtering(seg) => f.debug_tuple("RemoveTokens").field(seg).finish(),
        }
    }
}

impl<S> RemoveTokens<S>
where
    S: Stream<Item = String>,
{
    /// Remove `tokens` from `src`. Empty tokens are ignored; with none left,
    /// `src` passes through untouched.
    pub fn new<T: AsRef<str>>(src: S, tokens: &[T]) -> Self {
        let tokens: Vec<String> = tokens
            .iter()
            .map(|t| t.as_ref())
            .filter(|t| !t.is_empty())
            .map(String::from)
            .collect();
        if tokens.is_empty() {
            return Self {
                inner: Inner::Passthrough(src),
            };
        }
        let min_len = max_char_len(tokens.iter().map(String::as_str));
        Self {
            inner: Inner::Filtering(Segmenter::new(src, RemovePolicy { tokens }, min_len)),
        }
    }
}

impl<S> Stream for RemoveTokens<S>
where
    S: Stream<Item = String>,
{
    type Item = String;

    fn recv(&mut self) -> Result<Option<String>> {
        match &mut self.inner {
            Inner::Passthrough(src) => src.recv(),
            Inner::Filtering(seg) => seg.recv(),
        }
    }
}

/// Remove `tokens` from `src`
pub fn remove_tokens<S, T>(src: S, tokens: &[T]) -> RemoveTokens<S>
where
    S: Stream<Item = String>,
    T: AsRef<str>,
{
    RemoveTokens::new(src, tokens)
}

/// Same as [`remove_tokens`], for label markers
pub fn remove_labels<S, T>(src: S, labels: &[T]) -> RemoveTokens<S>
where
    S: Stream<Item = String>,
    T: AsRef<str>,
{
    RemoveTokens::new(src, labels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rill_core::{collect_string, from_fn, from_iter, StreamError};

    fn run(input: &[&str], tokens: &[&str]) -> String {
        let src = from_iter(input.iter().map(|s| s.to_string()).collect::<Vec<_>>());
        collect_string(remove_tokens(src, tokens)).unwrap()
    }

    #[test]
    fn test_no_tokens_passes_through() {
        assert_eq!(run(&["hello", "world"], &[]), "helloworld");
        assert_eq!(run(&["hello", "world"], &["", ""]), "helloworld");
    }

    #[test]
    fn test_upstream_error_discards_residual() {
        let mut calls = 0;
        let src = from_fn(move || {
            calls += 1;
            match calls {
                1 => Ok(Some("abc".to_string())),
                _ => Err(StreamError::msg("disconnected")),
            }
        });
        let mut s = remove_tokens(src, &["<|long-token|>"]);
        let first = s.recv().unwrap_err();
        assert_eq!(first.to_string(), "disconnected");
        match &s.inner {
            Inner::Filtering(seg) => assert_eq!(seg.residual(), ""),
            Inner::Passthrough(_) => panic!("tokens were given"),
        }
        assert!(s.recv().unwrap_err().same_as(&first));
    }

    #[test]
    fn test_single_token() {
        assert_eq!(run(&["foo", "bar", "baz"], &["bar"]), "foobaz");
        assert_eq!(run(&["left"], &["foo"]), "left");
    }

    #[test]
    fn test_token_across_chunks() {
        assert_eq!(run(&["a", "b", "c", "d"], &["bc"]), "ad");
        assert_eq!(run(&["00000", "ab", "cd"], &["bc"]), "00000ad");
    }

    #[test]
    fn test_earliest_token_wins() {
        assert_eq!(run(&["a", "bc", "d"], &["bc", "ab"]), "cd");
        assert_eq!(run(&["00", "ab", "cd"], &["bc", "ab"]), "00cd");
        assert_eq!(run(&["ab", "cd"], &["bc", "ab"]), "cd");
        assert_eq!(run(&["abcd"], &["bc", "ab"]), "cd");
    }

    #[test]
    fn test_removal_is_not_rescanned() {
        assert_eq!(run(&["ab", "cd"], &["bc", "ad"]), "ad");
        assert_eq!(run(&["abcd"], &["bc", "ad"]), "ad");
    }

    #[test]
    fn test_multiple_tokens() {
        assert_eq!(
            run(&["prefix", "token1", "middle", "token2", "suffix"], &["token1", "token2"]),
            "prefixmiddlesuffix"
        );
    }

    #[test]
    fn test_tags_split_mid_token() {
        let input = [
            "Try something soothing, like <",
            "med>chamomile<",
            "/med> or <med>ginger</med>",
            "<med>honey</med><ask>",
            "How long has this lasted?</ask>",
        ];
        assert_eq!(
            run(&input, &["<med>", "</med>"]),
            "Try something soothing, like chamomile or gingerhoney<ask>How long has this lasted?</ask>"
        );
    }
}
