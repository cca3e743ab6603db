//! Shared, lock-protected stream handle

use crate::error::Result;
use crate::stream::Stream;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

/// A stream that many owners can pull from.
///
/// Clones share the same underlying stream; each item goes to exactly one of
/// them. Pulls are serialized by a mutex.
pub struct SafeStream<S> {
    inner: Arc<Mutex<S>>,
}

impl<S> Clone for SafeStream<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S> fmt::Debug for SafeStream<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SafeStream")
            .field("handles", &Arc::strong_count(&self.inner))
            .finish()
    }
}

impl<S> SafeStream<S> {
    pub fn new(src: S) -> Self {
        Self {
            inner: Arc::new(Mutex::new(src)),
        }
    }
}

impl<S: Stream> Stream for SafeStream<S> {
    type Item = S::Item;

    fn recv(&mut self) -> Result<Option<S::Item>> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .recv()
    }
}
