//! Buffered decoupler: move production onto its own thread
//!
//! [`with_buffer`] spawns a producer that pulls the source as fast as it can
//! and parks every outcome in a [`ConcurrentQueue`]. The consumer side only
//! ever waits on that queue. Prefetch is unbounded.

use crate::error::{Result, StreamError};
use crate::queue::ConcurrentQueue;
use crate::stream::{Stream, Terminal};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use tracing::{debug, trace};

const PRODUCER_THREAD_NAME: &str = "rill-buffer";

struct Shared<T> {
    queue: ConcurrentQueue<Result<Option<T>>>,
    abandoned: AtomicBool,
}

/// Consumer half of [`with_buffer`]
pub struct Buffered<T> {
    shared: Arc<Shared<T>>,
    terminal: Option<Terminal>,
}

impl<T> fmt::Debug for Buffered<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Buffered")
            .field("queued", &self.shared.queue.len())
            .field("terminal", &self.terminal)
            .finish()
    }
}

impl<T> Buffered<T> {
    /// Outcomes already produced but not yet received
    pub fn queued(&self) -> usize {
        self.shared.queue.len()
    }
}

impl<T> Stream for Buffered<T> {
    type Item = T;

    fn recv(&mut self) -> Result<Option<T>> {
        if let Some(terminal) = &self.terminal {
            return terminal.replay();
        }
        let outcome = self.shared.queue.pop_wait();
        self.terminal = Terminal::of(&outcome);
        outcome
    }
}

impl<T> Drop for Buffered<T> {
    fn drop(&mut self) {
        self.shared.abandoned.store(true, Ordering::Release);
    }
}

// Reports `ProducerLost` if the producer unwinds before it queued a terminal
// outcome.
struct ProducerGuard<T> {
    shared: Arc<Shared<T>>,
    finished: bool,
}

impl<T> Drop for ProducerGuard<T> {
    fn drop(&mut self) {
        if !self.finished {
            self.shared.queue.push(Err(StreamError::ProducerLost));
        }
    }
}

fn produce<S: Stream>(mut src: S, mut guard: ProducerGuard<S::Item>) {
    let mut produced = 0usize;
    loop {
        if guard.shared.abandoned.load(Ordering::Acquire) {
            debug!(produced, "buffered stream abandoned, producer stopping");
            guard.finished = true;
            return;
        }
        let outcome = src.recv();
        let done = Terminal::of(&outcome).is_some();
        if !done {
            produced += 1;
            trace!(produced, "buffered item");
        }
        guard.shared.queue.push(outcome);
        if done {
            debug!(produced, "buffered producer reached terminal outcome");
            guard.finished = true;
            return;
        }
    }
}

/// Pull `src` on a dedicated thread and receive its outcomes through a queue.
///
/// The producer stops after the first terminal outcome, or before its next
/// pull once the returned stream has been dropped. If the producer cannot be
/// started or panics, the consumer receives [`StreamError::ProducerLost`]
/// instead of blocking forever.
pub fn with_buffer<S>(src: S) -> Buffered<S::Item>
where
    S: Stream + Send + 'static,
    S::Item: Send + 'static,
{
    let shared = Arc::new(Shared {
        queue: ConcurrentQueue::new(),
        abandoned: AtomicBool::new(false),
    });
    let guard = ProducerGuard {
        shared: Arc::clone(&shared),
        finished: false,
    };

    let spawned = thread::Builder::new()
        .name(PRODUCER_THREAD_NAME.to_string())
        .spawn(move || produce(src, guard));
    match spawned {
        Ok(_) => debug!("buffered producer started"),
        Err(err) => {
            // The closure, and the guard inside it, were dropped by the failed
            // spawn, which already queued `ProducerLost`.
            debug!(error = %err, "failed to start buffered producer");
        }
    }

    Buffered {
        shared,
        terminal: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::create::{from_fn, from_iter};
    use crate::ext::StreamExt;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    #[test]
    fn test_buffered_preserves_order_and_end() {
        let mut s = with_buffer(from_iter(0..50));
        for want in 0..50 {
            assert_eq!(s.recv().unwrap(), Some(want));
        }
        assert_eq!(s.recv().unwrap(), None);
        assert_eq!(s.recv().unwrap(), None);
    }

    #[test]
    fn test_buffered_replays_error() {
        let mut calls = 0;
        let src = from_fn(move || {
            calls += 1;
            if calls == 1 {
                Ok(Some("first"))
            } else {
                Err(StreamError::msg("source gone"))
            }
        });
        let mut s = with_buffer(src);
        assert_eq!(s.recv().unwrap(), Some("first"));
        let err = s.recv().unwrap_err();
        assert_eq!(err.to_string(), "source gone");
        assert!(s.recv().unwrap_err().same_as(&err));
    }

    #[test]
    fn test_producer_panic_reports_lost() {
        let mut calls = 0;
        let src = from_fn(move || {
            calls += 1;
            if calls > 2 {
                panic!("producer crashed");
            }
            Ok(Some(calls))
        });
        let got: Vec<_> = with_buffer(src).iter().collect();
        assert_eq!(got.len(), 3);
        assert!(matches!(got[2], Err(StreamError::ProducerLost)));
    }

    #[test]
    fn test_producer_stops_after_drop() {
        let pulls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&pulls);
        let src = from_fn(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(2));
            Ok(Some(()))
        });
        let mut s = with_buffer(src);
        assert_eq!(s.recv().unwrap(), Some(()));
        drop(s);

        thread::sleep(Duration::from_millis(50));
        let after_drop = pulls.load(Ordering::SeqCst);
        thread::sleep(Duration::from_millis(50));
        assert_eq!(pulls.load(Ordering::SeqCst), after_drop);
    }
}
