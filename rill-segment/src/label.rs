//! Label engine: split text into regions opened and closed by tokens
//!
//! Each [`Label`] fires at most once. While no label is open, the earliest
//! start token in the buffer opens its label; text before it is emitted under
//! whichever label was open before (or as unlabeled text). While a label is
//! open, its end token competes with the remaining start tokens: the earliest
//! occurrence wins, and the end token wins a tie. The start token is never
//! emitted; the end token stays in the buffer so a following start token can
//! overlap it.
//!
//! A label without an end token absorbs everything up to the end of the
//! stream.

use crate::chunk::{Label, LabeledChunk};
use crate::engine::{CutPolicy, Segmenter};
use crate::error::{Result, SegmentError};
use crate::residual::{max_char_len, ResidualBuffer, Search};
use rill_core::{BoxStream, Stream, StreamExt};
use std::collections::HashMap;
use std::fmt;
use tracing::trace;

/// Check a label set for use with [`LabelStream`]
pub fn validate_labels(labels: &[Label]) -> Result<()> {
    if labels.is_empty() {
        return Err(SegmentError::EmptyLabelSet);
    }
    if let Some(index) = labels.iter().position(|l| l.name.is_empty()) {
        return Err(SegmentError::UnnamedLabel { index });
    }
    Ok(())
}

/// Cut policy of [`LabelStream`]
#[derive(Debug, Clone)]
pub struct LabelPolicy {
    remaining: Vec<Label>,
    open: Option<Label>,
}

impl LabelPolicy {
    fn new(labels: Vec<Label>) -> Self {
        Self {
            remaining: labels,
            open: None,
        }
    }

    fn min_len(&self) -> usize {
        let starts = max_char_len(self.remaining.iter().map(|l| l.start_token.as_str()));
        let end = self
            .open
            .as_ref()
            .map_or(0, |l| l.end_token.chars().count());
        starts.max(end)
    }

    fn open_name(&self) -> &str {
        self.open.as_ref().map_or("", |l| l.name.as_str())
    }

    /// The currently open label, if any
    pub fn open_label(&self) -> Option<&Label> {
        self.open.as_ref()
    }

    /// Labels that have not fired yet
    pub fn remaining(&self) -> &[Label] {
        &self.remaining
    }
}

impl CutPolicy for LabelPolicy {
    type Output = LabeledChunk;

    fn cut(&mut self, buf: &mut ResidualBuffer) -> Option<LabeledChunk> {
        loop {
            if !buf.is_overflowing() {
                return None;
            }
            if let Some(open) = self.open.as_ref().filter(|l| l.is_unbounded()) {
                return Some(LabeledChunk::new(open.name.clone(), buf.take_all()));
            }

            // Candidate 0 is the open label's end token, if a label is open.
            // Empty start tokens only apply while no label is open.
            let has_end = self.open.is_some();
            let mut candidates: Vec<&str> = Vec::with_capacity(self.remaining.len() + 1);
            let mut starts: Vec<usize> = Vec::with_capacity(self.remaining.len());
            if let Some(open) = &self.open {
                candidates.push(&open.end_token);
            }
            for (pos, label) in self.remaining.iter().enumerate() {
                if has_end && label.start_token.is_empty() {
                    continue;
                }
                candidates.push(&label.start_token);
                starts.push(pos);
            }
            let found = buf.search(&candidates);

            match found {
                Search::Pending => return None,
                Search::NotFound => {
                    let text = buf.release_overflow()?;
                    return Some(LabeledChunk::new(self.open_name(), text));
                }
                Search::Found { index: 0, offset } if has_end => {
                    let text = buf.split_off_front(offset);
                    let closed = self.open.take()?;
                    trace!(label = %closed.name, "label closed");
                    buf.set_min_len(self.min_len());
                    if !text.is_empty() {
                        return Some(LabeledChunk::new(closed.name, text));
                    }
                }
                Search::Found { index, offset } => {
                    let label = self.remaining.remove(starts[index - usize::from(has_end)]);
                    let before = buf.split_off_front(offset);
                    buf.skip(label.start_token.len());
                    trace!(label = %label.name, "label opened");

                    if label.is_unbounded() {
                        buf.pin_to_zero();
                    }
                    let previous = self.open.replace(label);
                    buf.set_min_len(self.min_len());
                    if !before.is_empty() {
                        let name = previous.map_or_else(String::new, |l| l.name);
                        return Some(LabeledChunk::new(name, before));
                    }
                }
            }
        }
    }
}

/// Label engine over a stream of text chunks
pub struct LabelStream<S> {
    inner: Segmenter<S, LabelPolicy>,
    names: Vec<String>,
}

impl<S> fmt::Debug for LabelStream<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LabelStream")
            .field("names", &self.names)
            .field("inner", &self.inner)
            .finish()
    }
}

impl<S> LabelStream<S>
where
    S: Stream<Item = String>,
{
    /// Build a label engine; labels are matched in the given order of
    /// priority
    pub fn new(src: S, labels: Vec<Label>) -> Result<Self> {
        validate_labels(&labels)?;
        let names = labels.iter().map(|l| l.name.clone()).collect();
        let policy = LabelPolicy::new(labels);
        let min_len = policy.min_len();
        Ok(Self {
            inner: Segmenter::new(src, policy, min_len),
            names,
        })
    }

    /// Names of every configured label
    pub fn label_names(&self) -> &[String] {
        &self.names
    }

    pub fn policy(&self) -> &LabelPolicy {
        self.inner.policy()
    }

    /// Split into one text stream per label, plus `""` for unlabeled text.
    ///
    /// Every returned stream must be drained, or all of them dropped.
    pub fn demux(self) -> HashMap<String, BoxStream<String>>
    where
        S: Send + 'static,
    {
        let names = self.names.clone();
        split_text(self, &names)
    }
}

impl<S> Stream for LabelStream<S>
where
    S: Stream<Item = String>,
{
    type Item = LabeledChunk;

    fn recv(&mut self) -> rill_core::Result<Option<LabeledChunk>> {
        self.inner.recv()
    }
}

fn label_of(chunk: &LabeledChunk) -> &str {
    &chunk.label
}

/// Demux labeled chunks into per-label text streams
pub fn split_text<S>(src: S, names: &[String]) -> HashMap<String, BoxStream<String>>
where
    S: Stream<Item = LabeledChunk> + Send + 'static,
{
    rill_core::demux(src, label_of, names)
        .into_iter()
        .map(|(name, stream)| (name, stream.map(|c| c.chunk).boxed()))
        .collect()
}
