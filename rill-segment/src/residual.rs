//! The residual buffer shared by every segmentation engine
//!
//! Text sits here until enough lookahead has arrived that no token could still
//! be forming across its end. The bound is `min_len`, counted in code points:
//! text is only released while the buffer is longer than that.

use std::mem;

/// Where the earliest token occurrence sits in the buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Search {
    /// `candidates[index]` occurs at byte `offset`, and no higher-priority
    /// candidate can still complete at or before that offset
    Found { index: usize, offset: usize },
    /// A match exists but an earlier candidate is still incomplete; more
    /// input is needed before deciding
    Pending,
    /// No candidate occurs in the buffer
    NotFound,
}

/// Accumulator of not-yet-emitted text
#[derive(Debug, Clone, Default)]
pub struct ResidualBuffer {
    text: String,
    min_len: usize,
    pinned: bool,
}

impl ResidualBuffer {
    pub fn new(min_len: usize) -> Self {
        Self {
            text: String::new(),
            min_len,
            pinned: false,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn push_str(&mut self, chunk: &str) {
        self.text.push_str(chunk);
    }

    /// Length in code points
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    pub fn min_len(&self) -> usize {
        self.min_len
    }

    /// Whether the buffer holds more than `min_len` code points
    pub fn is_overflowing(&self) -> bool {
        !self.text.is_empty() && self.char_len() > self.min_len
    }

    /// Change the lookahead bound; ignored once pinned
    pub fn set_min_len(&mut self, min_len: usize) {
        if !self.pinned {
            self.min_len = min_len;
        }
    }

    /// Drop the lookahead bound for good: no more text will arrive, or
    /// everything left belongs to one region
    pub fn pin_to_zero(&mut self) {
        self.min_len = 0;
        self.pinned = true;
    }

    pub fn is_pinned(&self) -> bool {
        self.pinned
    }

    /// Locate the earliest candidate occurrence.
    ///
    /// Ties at one offset go to the candidate listed first. Empty candidates
    /// match at offset 0. Unless the buffer is pinned, a match is only
    /// reported once no higher-priority candidate could still complete with
    /// more input.
    pub fn search(&self, candidates: &[&str]) -> Search {
        let best = candidates
            .iter()
            .enumerate()
            .filter_map(|(index, token)| self.text.find(token).map(|offset| (offset, index)))
            .min();
        let Some((offset, index)) = best else {
            return Search::NotFound;
        };
        if !self.pinned && self.may_complete_before(candidates, offset, index) {
            return Search::Pending;
        }
        Search::Found { index, offset }
    }

    // True if some candidate is a proper prefix-match of the buffer tail
    // starting before `offset`, or at `offset` with higher priority.
    fn may_complete_before(&self, candidates: &[&str], offset: usize, index: usize) -> bool {
        let longest = candidates.iter().map(|t| t.len()).max().unwrap_or(0);
        let from = self.text.len().saturating_sub(longest);
        self.text
            .char_indices()
            .map(|(pos, _)| pos)
            .filter(|&pos| pos >= from && pos <= offset)
            .any(|pos| {
                let tail = &self.text[pos..];
                candidates.iter().enumerate().any(|(i, token)| {
                    (pos < offset || i < index) && token.len() > tail.len() && token.starts_with(tail)
                })
            })
    }

    /// Remove and return the first `at` bytes
    pub fn split_off_front(&mut self, at: usize) -> String {
        let rest = self.text.split_off(at);
        mem::replace(&mut self.text, rest)
    }

    /// Drop the first `bytes` bytes
    pub fn skip(&mut self, bytes: usize) {
        self.text.drain(..bytes);
    }

    pub fn take_all(&mut self) -> String {
        mem::take(&mut self.text)
    }

    /// Release everything beyond the last `min_len` code points
    pub fn release_overflow(&mut self) -> Option<String> {
        let keep = self.min_len;
        let total = self.char_len();
        if total <= keep {
            return None;
        }
        let cut = self
            .text
            .char_indices()
            .nth(total - keep)
            .map_or(self.text.len(), |(pos, _)| pos);
        Some(self.split_off_front(cut))
    }

    pub fn clear(&mut self) {
        self.text.clear();
    }
}

/// Longest candidate, in code points
pub(crate) fn max_char_len<'a>(tokens: impl IntoIterator<Item = &'a str>) -> usize {
    tokens
        .into_iter()
        .map(|t| t.chars().count())
        .max()
        .unwrap_or(0)
}
