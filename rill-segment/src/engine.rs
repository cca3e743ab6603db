//! Shared driver for the segmentation engines

use crate::residual::ResidualBuffer;
use rill_core::{Result, Stream, StreamError};
use std::fmt;

/// One resolution step of a segmentation engine.
///
/// `cut` inspects the buffer and either produces one output, consuming the
/// text it covers, or returns `None` when nothing more can be decided without
/// further input. It is called repeatedly before every upstream pull, and
/// after the upstream ends (with the buffer pinned) until it returns `None`.
pub trait CutPolicy {
    type Output;

    fn cut(&mut self, buf: &mut ResidualBuffer) -> Option<Self::Output>;
}

#[derive(Debug)]
enum Upstream {
    Open,
    Ended,
    Failed(StreamError),
}

/// Pulls text chunks from `src` into a [`ResidualBuffer`] and lets a
/// [`CutPolicy`] decide what to emit.
///
/// An upstream error discards the unflushed residual text and is reported on
/// this and every later call.
pub struct Segmenter<S, P> {
    src: S,
    policy: P,
    buffer: ResidualBuffer,
    upstream: Upstream,
}

impl<S, P: fmt::Debug> fmt::Debug for Segmenter<S, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Segmenter")
            .field("policy", &self.policy)
            .field("buffer", &self.buffer)
            .field("upstream", &self.upstream)
            .finish()
    }
}

impl<S, P> Segmenter<S, P> {
    pub fn new(src: S, policy: P, min_len: usize) -> Self {
        Self {
            src,
            policy,
            buffer: ResidualBuffer::new(min_len),
            upstream: Upstream::Open,
        }
    }

    pub fn policy(&self) -> &P {
        &self.policy
    }

    /// Text received but not yet emitted
    pub fn residual(&self) -> &str {
        self.buffer.as_str()
    }
}

impl<S, P> Stream for Segmenter<S, P>
where
    S: Stream<Item = String>,
    P: CutPolicy,
{
    type Item = P::Output;

    fn recv(&mut self) -> Result<Option<P::Output>> {
        loop {
            if let Some(out) = self.policy.cut(&mut self.buffer) {
                return Ok(Some(out));
            }
            match &self.upstream {
                Upstream::Open => {}
                Upstream::Ended => return Ok(None),
                Upstream::Failed(err) => return Err(err.clone()),
            }
            match self.src.recv() {
                Ok(Some(chunk)) => self.buffer.push_str(&chunk),
                Ok(None) => {
                    self.upstream = Upstream::Ended;
                    self.buffer.pin_to_zero();
                }
                Err(err) => {
                    self.buffer.clear();
                    self.upstream = Upstream::Failed(err.clone());
                    return Err(err);
                }
            }
        }
    }
}
