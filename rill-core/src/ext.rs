//! Combinator methods available on every [`Stream`]

use crate::adapters::{Filter, Map, MapResult, OnEof, SkipN, SkipUntil, Substitute, TakeWhile};
use crate::buffer::{self, Buffered};
use crate::error::Result;
use crate::fork::{self, ForkReader};
use crate::observe::{WithLog, WithTrace};
use crate::safe::SafeStream;
use crate::stream::{BoxStream, Iter, Stream};
use crate::throttle::{ThrottleMerge, ThrottleMerge2};
use std::sync::mpsc::{self, Receiver};
use std::thread;
use std::time::Duration;
use tracing::{debug, trace};

const FORWARD_CAPACITY: usize = 16;

/// Extension methods for [`Stream`]
pub trait StreamExt: Stream {
    /// Erase the concrete type
    fn boxed(self) -> BoxStream<Self::Item>
    where
        Self: Sized + Send + 'static,
    {
        Box::new(self)
    }

    /// Iterate over items; a failure is yielded once as the last element
    fn iter(self) -> Iter<Self>
    where
        Self: Sized,
    {
        Iter::new(self)
    }

    /// Feed every item to `handle` until the stream ends or either side fails
    fn consume<F>(mut self, mut handle: F) -> Result<()>
    where
        Self: Sized,
        F: FnMut(Self::Item) -> Result<()>,
    {
        while let Some(item) = self.recv()? {
            handle(item)?;
        }
        Ok(())
    }

    /// Collect every item, or the first error
    fn try_collect(self) -> Result<Vec<Self::Item>>
    where
        Self: Sized,
    {
        let mut items = Vec::new();
        self.consume(|item| {
            items.push(item);
            Ok(())
        })?;
        Ok(items)
    }

    fn map<F, R>(self, f: F) -> Map<Self, F>
    where
        Self: Sized,
        F: FnMut(Self::Item) -> R,
    {
        Map::new(self, f)
    }

    /// Map every outcome, including the terminal one
    fn map_result<F, R>(self, f: F) -> MapResult<Self, F>
    where
        Self: Sized,
        F: FnMut(Result<Option<Self::Item>>) -> Result<Option<R>>,
    {
        MapResult::new(self, f)
    }

    fn filter<P>(self, predicate: P) -> Filter<Self, P>
    where
        Self: Sized,
        P: FnMut(&Self::Item) -> bool,
    {
        Filter::new(self, predicate)
    }

    /// Drop items until `predicate` first holds; that item is kept
    fn skip_until<P>(self, predicate: P) -> SkipUntil<Self, P>
    where
        Self: Sized,
        P: FnMut(&Self::Item) -> bool,
    {
        SkipUntil::new(self, predicate)
    }

    fn skip_n(self, n: usize) -> SkipN<Self>
    where
        Self: Sized,
    {
        SkipN::new(self, n)
    }

    /// End the stream at the first item failing `predicate`
    fn take_while<P>(self, predicate: P) -> TakeWhile<Self, P>
    where
        Self: Sized,
        P: FnMut(&Self::Item) -> bool,
    {
        TakeWhile::new(self, predicate)
    }

    /// Run `hook` once, when the stream first ends normally
    fn on_eof<F>(self, hook: F) -> OnEof<Self, F>
    where
        Self: Sized,
        F: FnOnce(),
    {
        OnEof::new(self, hook)
    }

    /// Swap the rest of the stream for the one `replace` returns, at the first
    /// item for which it returns `Some`
    fn substitute<F>(self, replace: F) -> Substitute<Self::Item, F>
    where
        Self: Sized + Send + 'static,
        F: FnMut(&Self::Item) -> Option<BoxStream<Self::Item>>,
    {
        Substitute::new(self.boxed(), replace)
    }

    /// See [`fork::fork`]
    fn fork(self, copies: usize) -> Vec<ForkReader<Self::Item>>
    where
        Self: Sized + Send + 'static,
    {
        fork::fork(self, copies)
    }

    /// See [`buffer::with_buffer`]
    fn with_buffer(self) -> Buffered<Self::Item>
    where
        Self: Sized + Send + 'static,
        Self::Item: Send + 'static,
    {
        buffer::with_buffer(self)
    }

    /// See [`throttle_merge`](crate::throttle::throttle_merge)
    fn throttle_merge<F>(self, merge: F, window: Duration) -> ThrottleMerge<Self, F>
    where
        Self: Sized,
        F: FnMut(&Self::Item, &Self::Item) -> Option<Self::Item>,
    {
        ThrottleMerge::new(self, merge, window)
    }

    /// See [`throttle_merge2`](crate::throttle::throttle_merge2)
    fn throttle_merge2<F>(self, merge: F, window: Duration) -> ThrottleMerge2<Self, F>
    where
        Self: Sized,
        F: FnMut(Vec<Self::Item>) -> Vec<Self::Item>,
    {
        ThrottleMerge2::new(self, merge, window)
    }

    /// Emit `tracing` events when consumption starts, completes or fails
    fn with_log(self, key: impl Into<String>) -> WithLog<Self>
    where
        Self: Sized,
    {
        WithLog::new(self, key)
    }

    /// Report a [`StreamReport`](crate::observe::StreamReport) to `span` at the
    /// first terminal outcome
    fn with_trace<P>(self, span: P) -> WithTrace<Self, P>
    where
        Self: Sized,
    {
        WithTrace::new(self, span)
    }

    /// Share this stream between several handles
    fn safe(self) -> SafeStream<Self>
    where
        Self: Sized,
    {
        SafeStream::new(self)
    }

    /// Forward items into a channel from a background thread.
    ///
    /// The channel closes at the end of the stream and also on failure; the
    /// error itself is dropped. Use [`consume`](StreamExt::consume) when errors
    /// matter. Dropping the receiver stops the thread before its next pull.
    /// The receiver must be drained or dropped, otherwise the thread stays
    /// blocked on the full channel.
    fn to_receiver(self) -> Receiver<Self::Item>
    where
        Self: Sized + Send + 'static,
        Self::Item: Send + 'static,
    {
        let (tx, rx) = mpsc::sync_channel(FORWARD_CAPACITY);
        let spawned = thread::Builder::new()
            .name("rill-forward".to_string())
            .spawn(move || {
                let mut src = self;
                loop {
                    match src.recv() {
                        Ok(Some(item)) => {
                            if tx.send(item).is_err() {
                                trace!("receiver dropped, forwarding stopped");
                                break;
                            }
                        }
                        Ok(None) => break,
                        Err(err) => {
                            debug!(error = %err, "forwarded stream failed");
                            break;
                        }
                    }
                }
            });
        if let Err(err) = spawned {
            debug!(error = %err, "failed to start forwarding thread");
        }
        rx
    }
}

impl<S: Stream + ?Sized> StreamExt for S {}
