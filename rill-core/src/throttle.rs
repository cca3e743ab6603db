//! Time-windowed coalescing
//!
//! Two strategies for batching adjacent items before they reach a slow
//! consumer:
//!
//! - [`ThrottleMerge`] folds items pairwise while a merge function accepts
//!   them, emitting whenever the window since the last emission has elapsed or
//!   an item refuses to merge.
//! - [`ThrottleMerge2`] collects raw items for one window and hands the whole
//!   batch to a merge function that may return any number of items.
//!
//! In both, the first item goes out as soon as it arrives and a terminal
//! outcome from the source flushes whatever is pending before it is reported.

use crate::error::Result;
use crate::observe::millis;
use crate::stream::{Stream, Terminal};
use std::collections::VecDeque;
use std::fmt;
use std::mem;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use tracing::trace;

/// Source of the current time for throttling decisions
pub trait Clock {
    fn now(&self) -> Instant;
}

/// Wall clock backed by [`Instant::now`]
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to.
///
/// Clones share the same time, so a test can hand one clone to a throttle and
/// advance another from inside its source.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<Instant>>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Arc::new(Mutex::new(Instant::now())),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn window_elapsed<C: Clock>(clock: &C, since: Option<Instant>, window: Duration) -> bool {
    since.map_or(true, |at| clock.now().saturating_duration_since(at) >= window)
}

/// Stream for [`throttle_merge`]
pub struct ThrottleMerge<S: Stream, F, C = SystemClock> {
    src: S,
    merge: F,
    window: Duration,
    clock: C,
    pending: Option<S::Item>,
    terminal: Option<Terminal>,
    last_emit: Option<Instant>,
}

impl<S: Stream, F, C> fmt::Debug for ThrottleMerge<S, F, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThrottleMerge")
            .field("window", &self.window)
            .field("pending", &self.pending.is_some())
            .field("terminal", &self.terminal)
            .finish()
    }
}

impl<S, F> ThrottleMerge<S, F>
where
    S: Stream,
    F: FnMut(&S::Item, &S::Item) -> Option<S::Item>,
{
    pub fn new(src: S, merge: F, window: Duration) -> Self {
        Self::with_clock(src, merge, window, SystemClock)
    }
}

impl<S, F, C> ThrottleMerge<S, F, C>
where
    S: Stream,
    F: FnMut(&S::Item, &S::Item) -> Option<S::Item>,
    C: Clock,
{
    pub fn with_clock(src: S, merge: F, window: Duration, clock: C) -> Self {
        Self {
            src,
            merge,
            window,
            clock,
            pending: None,
            terminal: None,
            last_emit: None,
        }
    }

    fn pull(&mut self) -> Result<Option<S::Item>> {
        let outcome = self.src.recv();
        self.terminal = Terminal::of(&outcome);
        outcome
    }

    fn emit(&mut self, item: S::Item) -> Result<Option<S::Item>> {
        self.last_emit = Some(self.clock.now());
        trace!(window_ms = millis(self.window), "throttle emit");
        Ok(Some(item))
    }
}

impl<S, F, C> Stream for ThrottleMerge<S, F, C>
where
    S: Stream,
    F: FnMut(&S::Item, &S::Item) -> Option<S::Item>,
    C: Clock,
{
    type Item = S::Item;

    fn recv(&mut self) -> Result<Option<S::Item>> {
        if let Some(terminal) = &self.terminal {
            return terminal.replay();
        }
        let mut pending = match self.pending.take() {
            Some(item) => item,
            None => match self.pull()? {
                Some(item) => item,
                None => return Ok(None),
            },
        };

        loop {
            if window_elapsed(&self.clock, self.last_emit, self.window) {
                return self.emit(pending);
            }
            match self.pull() {
                Ok(Some(next)) => match (self.merge)(&pending, &next) {
                    Some(merged) => pending = merged,
                    None => {
                        self.pending = Some(next);
                        return self.emit(pending);
                    }
                },
                // The terminal outcome is recorded; it follows on the next call.
                Ok(None) | Err(_) => return self.emit(pending),
            }
        }
    }
}

/// Coalesce adjacent items pairwise within a time window.
///
/// `merge(a, b)` returns the combined item, or `None` if `b` must start a new
/// item. The first item is emitted immediately. After that, items are folded
/// together until `window` has passed since the last emission or `merge`
/// rejects an item.
pub fn throttle_merge<S, F>(src: S, merge: F, window: Duration) -> ThrottleMerge<S, F>
where
    S: Stream,
    F: FnMut(&S::Item, &S::Item) -> Option<S::Item>,
{
    ThrottleMerge::new(src, merge, window)
}

/// Stream for [`throttle_merge2`]
pub struct ThrottleMerge2<S: Stream, F, C = SystemClock> {
    src: S,
    merge: F,
    window: Duration,
    clock: C,
    raw: Vec<S::Item>,
    ready: VecDeque<S::Item>,
    terminal: Option<Terminal>,
    last_flush: Option<Instant>,
}

impl<S: Stream, F, C> fmt::Debug for ThrottleMerge2<S, F, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThrottleMerge2")
            .field("window", &self.window)
            .field("raw", &self.raw.len())
            .field("ready", &self.ready.len())
            .field("terminal", &self.terminal)
            .finish()
    }
}

impl<S, F> ThrottleMerge2<S, F>
where
    S: Stream,
    F: FnMut(Vec<S::Item>) -> Vec<S::Item>,
{
    pub fn new(src: S, merge: F, window: Duration) -> Self {
        Self::with_clock(src, merge, window, SystemClock)
    }
}

impl<S, F, C> ThrottleMerge2<S, F, C>
where
    S: Stream,
    F: FnMut(Vec<S::Item>) -> Vec<S::Item>,
    C: Clock,
{
    pub fn with_clock(src: S, merge: F, window: Duration, clock: C) -> Self {
        Self {
            src,
            merge,
            window,
            clock,
            raw: Vec::new(),
            ready: VecDeque::new(),
            terminal: None,
            last_flush: None,
        }
    }

    fn pull(&mut self) {
        match self.src.recv() {
            Ok(Some(item)) => self.raw.push(item),
            outcome => {
                self.flush();
                self.terminal = Terminal::of(&outcome);
            }
        }
    }

    fn flush(&mut self) {
        self.last_flush = Some(self.clock.now());
        if self.raw.is_empty() {
            return;
        }
        let batch = mem::take(&mut self.raw);
        let raw = batch.len();
        self.ready.extend((self.merge)(batch));
        trace!(raw, ready = self.ready.len(), "throttle flush");
    }
}

impl<S, F, C> Stream for ThrottleMerge2<S, F, C>
where
    S: Stream,
    F: FnMut(Vec<S::Item>) -> Vec<S::Item>,
    C: Clock,
{
    type Item = S::Item;

    fn recv(&mut self) -> Result<Option<S::Item>> {
        loop {
            if let Some(item) = self.ready.pop_front() {
                return Ok(Some(item));
            }
            if let Some(terminal) = &self.terminal {
                return terminal.replay();
            }
            if window_elapsed(&self.clock, self.last_flush, self.window) {
                if self.raw.is_empty() {
                    self.pull();
                }
                self.flush();
            } else {
                self.pull();
            }
        }
    }
}

/// Collect raw items for one window, then pass the batch through `merge`.
///
/// `merge` may return more or fewer items than it was given; its output is
/// emitted in order before the next batch is started. The first item is
/// flushed as soon as it arrives.
pub fn throttle_merge2<S, F>(src: S, merge: F, window: Duration) -> ThrottleMerge2<S, F>
where
    S: Stream,
    F: FnMut(Vec<S::Item>) -> Vec<S::Item>,
{
    ThrottleMerge2::new(src, merge, window)
}
