//! Logging and tracing decorators
//!
//! Both decorators are transparent: every outcome of the wrapped stream is
//! returned unchanged. They only observe the first pull and the first terminal
//! outcome.

use crate::error::{Result, StreamError};
use crate::stream::Stream;
use std::fmt;
use std::time::{Duration, Instant, SystemTime};
use tracing::{info, warn};

/// Whole milliseconds in `d`, saturating at `u64::MAX`
pub(crate) fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

/// Stream for [`StreamExt::with_log`](crate::StreamExt::with_log)
#[derive(Debug)]
pub struct WithLog<S> {
    src: S,
    key: String,
    started: Option<Instant>,
    items: usize,
    stopped: bool,
}

impl<S> WithLog<S> {
    pub(crate) fn new(src: S, key: impl Into<String>) -> Self {
        Self {
            src,
            key: key.into(),
            started: None,
            items: 0,
            stopped: false,
        }
    }
}

impl<S: Stream> Stream for WithLog<S> {
    type Item = S::Item;

    fn recv(&mut self) -> Result<Option<S::Item>> {
        let started = *self.started.get_or_insert_with(|| {
            info!(stream = %self.key, "stream consumption started");
            Instant::now()
        });

        let outcome = self.src.recv();
        if self.stopped {
            return outcome;
        }
        match &outcome {
            Ok(Some(_)) => self.items += 1,
            Ok(None) => {
                self.stopped = true;
                info!(
                    stream = %self.key,
                    items = self.items,
                    elapsed_ms = millis(started.elapsed()),
                    "stream consumption completed"
                );
            }
            Err(err) => {
                self.stopped = true;
                warn!(
                    stream = %self.key,
                    items = self.items,
                    error = %err,
                    "stream consumption failed"
                );
            }
        }
        outcome
    }
}

/// Summary of one stream's consumption, handed to a [`TraceSpan`]
#[derive(Debug, Clone)]
pub struct StreamReport<T> {
    /// Wall-clock time of the first pull
    pub started_at: SystemTime,
    /// Time from the first pull until it returned
    pub first_item_after: Duration,
    /// Time from the first pull until the terminal outcome
    pub elapsed: Duration,
    /// Every item the stream produced
    pub frames: Vec<T>,
    /// Terminal failure, if the stream did not end normally
    pub error: Option<StreamError>,
}

/// Sink for a finished [`StreamReport`]
pub trait TraceSpan<T> {
    fn finish(&mut self, report: StreamReport<T>);
}

impl<T: fmt::Debug> TraceSpan<T> for tracing::Span {
    fn finish(&mut self, report: StreamReport<T>) {
        self.in_scope(|| {
            let frames = report.frames.len();
            let elapsed_ms = millis(report.elapsed);
            let first_item_ms = millis(report.first_item_after);
            match &report.error {
                None => info!(
                    frames,
                    elapsed_ms,
                    first_item_ms,
                    output = ?report.frames,
                    "stream finished"
                ),
                Some(err) => warn!(
                    frames,
                    elapsed_ms,
                    first_item_ms,
                    error = %err,
                    "stream failed"
                ),
            }
        });
    }
}

struct TraceState<T> {
    started: Instant,
    started_at: SystemTime,
    first_item_after: Option<Duration>,
    frames: Vec<T>,
}

/// Stream for [`StreamExt::with_trace`](crate::StreamExt::with_trace)
pub struct WithTrace<S: Stream, P> {
    src: S,
    span: Option<P>,
    state: Option<TraceState<S::Item>>,
}

impl<S: Stream, P> fmt::Debug for WithTrace<S, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WithTrace")
            .field("finished", &self.span.is_none())
            .finish()
    }
}

impl<S: Stream, P> WithTrace<S, P> {
    pub(crate) fn new(src: S, span: P) -> Self {
        Self {
            src,
            span: Some(span),
            state: None,
        }
    }
}

impl<S, P> Stream for WithTrace<S, P>
where
    S: Stream,
    S::Item: Clone,
    P: TraceSpan<S::Item>,
{
    type Item = S::Item;

    fn recv(&mut self) -> Result<Option<S::Item>> {
        let state = self.state.get_or_insert_with(|| TraceState {
            started: Instant::now(),
            started_at: SystemTime::now(),
            first_item_after: None,
            frames: Vec::new(),
        });

        let outcome = self.src.recv();
        if state.first_item_after.is_none() {
            state.first_item_after = Some(state.started.elapsed());
        }
        let Some(span) = self.span.as_mut() else {
            return outcome;
        };

        let error = match &outcome {
            Ok(Some(item)) => {
                state.frames.push(item.clone());
                return outcome;
            }
            Ok(None) => None,
            Err(err) => Some(err.clone()),
        };
        span.finish(StreamReport {
            started_at: state.started_at,
            first_item_after: state.first_item_after.unwrap_or_default(),
            elapsed: state.started.elapsed(),
            frames: std::mem::take(&mut state.frames),
            error,
        });
        self.span = None;
        outcome
    }
}
