//! Shared cache, fork readers and demux
//!
//! A [`SharedCache`] owns one source stream and records every item it produces
//! in an append-only log. Any number of [`ForkReader`]s replay that log at
//! their own pace; the source is pulled at most once per position no matter
//! how many readers ask for it.
//!
//! The cache never evicts. It grows with the furthest-advanced reader for as
//! long as any reader is alive.

use crate::error::Result;
use crate::ext::StreamExt;
use crate::stream::{BoxStream, Stream, Terminal};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;

#[derive(Debug)]
struct CacheState<T> {
    items: Vec<T>,
    terminal: Option<Terminal>,
}

impl<T: Clone> CacheState<T> {
    fn lookup(&self, index: usize) -> Option<Result<Option<T>>> {
        if let Some(item) = self.items.get(index) {
            return Some(Ok(Some(item.clone())));
        }
        self.terminal.as_ref().map(Terminal::replay)
    }
}

/// Append-only log over a single source stream
pub struct SharedCache<T> {
    state: RwLock<CacheState<T>>,
    source: Mutex<BoxStream<T>>,
}

impl<T> fmt::Debug for SharedCache<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.read();
        f.debug_struct("SharedCache")
            .field("len", &state.items.len())
            .field("terminal", &state.terminal)
            .finish()
    }
}

impl<T> SharedCache<T> {
    fn new(source: BoxStream<T>) -> Self {
        Self {
            state: RwLock::new(CacheState {
                items: Vec::new(),
                terminal: None,
            }),
            source: Mutex::new(source),
        }
    }

    // The state is only mutated after the source call has returned, so a
    // poisoned lock still guards a consistent log.
    fn read(&self) -> RwLockReadGuard<'_, CacheState<T>> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, CacheState<T>> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn source(&self) -> MutexGuard<'_, BoxStream<T>> {
        self.source.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of items pulled from the source so far
    pub fn len(&self) -> usize {
        self.read().items.len()
    }

    /// Whether nothing has been pulled from the source yet
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the source has reported its terminal outcome
    pub fn is_terminated(&self) -> bool {
        self.read().terminal.is_some()
    }
}

impl<T: Clone> SharedCache<T> {
    /// Item at `index`, pulling the source if it has not been cached yet
    pub fn get(&self, index: usize) -> Result<Option<T>> {
        if let Some(hit) = self.read().lookup(index) {
            return hit;
        }
        self.load(index)
    }

    fn load(&self, index: usize) -> Result<Option<T>> {
        let mut state = self.write();
        // Another reader may have pulled while we waited for the lock.
        if let Some(hit) = state.lookup(index) {
            return hit;
        }
        if index != state.items.len() {
            // Served as-is: the freshly pulled item lands at the end of the log,
            // not at `index`.
            debug!(
                index,
                cached = state.items.len(),
                "fork reader ahead of shared cache"
            );
        }

        let outcome = self.source().recv();
        match &outcome {
            Ok(Some(item)) => state.items.push(item.clone()),
            Ok(None) => state.terminal = Some(Terminal::End),
            Err(err) => state.terminal = Some(Terminal::Failed(err.clone())),
        }
        outcome
    }
}

/// One independent reader over a [`SharedCache`].
///
/// Cloning a reader forks it: the clone starts at the current position of the
/// original and both advance independently from there.
pub struct ForkReader<T> {
    cache: Arc<SharedCache<T>>,
    index: usize,
}

impl<T> fmt::Debug for ForkReader<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ForkReader")
            .field("index", &self.index)
            .field("cache", &self.cache)
            .finish()
    }
}

impl<T> Clone for ForkReader<T> {
    fn clone(&self) -> Self {
        Self {
            cache: Arc::clone(&self.cache),
            index: self.index,
        }
    }
}

impl<T> ForkReader<T> {
    /// Fork this reader into `copies` readers sharing the same cache, each
    /// starting at this reader's current position
    pub fn fork(&self, copies: usize) -> Vec<ForkReader<T>> {
        (0..copies).map(|_| self.clone()).collect()
    }

    /// Position of the next item this reader will return
    pub fn position(&self) -> usize {
        self.index
    }

    /// The cache backing this reader
    pub fn cache(&self) -> &SharedCache<T> {
        &self.cache
    }
}

impl<T: Clone> Stream for ForkReader<T> {
    type Item = T;

    fn recv(&mut self) -> Result<Option<T>> {
        let index = self.index;
        self.index += 1;
        self.cache.get(index)
    }
}

/// Replicate `src` into `copies` independent readers.
///
/// `src` is moved into the shared cache and must not be consumed any other
/// way. To fork an existing [`ForkReader`] without re-wrapping it, use
/// [`ForkReader::fork`].
pub fn fork<S>(src: S, copies: usize) -> Vec<ForkReader<S::Item>>
where
    S: Stream + Send + 'static,
{
    let cache = Arc::new(SharedCache::new(src.boxed()));
    (0..copies)
        .map(|_| ForkReader {
            cache: Arc::clone(&cache),
            index: 0,
        })
        .collect()
}

/// Split `src` into two readers
pub fn tee<S>(src: S) -> (ForkReader<S::Item>, ForkReader<S::Item>)
where
    S: Stream + Send + 'static,
{
    let cache = Arc::new(SharedCache::new(src.boxed()));
    let first = ForkReader {
        cache: Arc::clone(&cache),
        index: 0,
    };
    let second = first.clone();
    (first, second)
}

/// Fan `src` out into one stream per label.
///
/// Each item lands in the stream whose key equals `classify(item)`. Items whose
/// label is not in `labels` go to the default stream under key `""`.
///
/// The source only advances when some reader asks for the next position, so
/// every returned stream must be driven to completion or all of them dropped
/// together.
///
/// `src` gets a cache of its own. Passing a [`ForkReader`] here stacks a second
/// cache on top of the reader's; use [`ForkReader::fork`] for further copies of
/// an existing reader.
pub fn demux<S, F, L>(src: S, classify: F, labels: &[L]) -> HashMap<String, BoxStream<S::Item>>
where
    S: Stream + Send + 'static,
    S::Item: Clone + Send + Sync + 'static,
    F: Fn(&S::Item) -> &str + Send + Sync + 'static,
    L: AsRef<str>,
{
    let classify = Arc::new(classify);
    let mut readers = fork(src, labels.len() + 1);
    let mut streams = HashMap::with_capacity(labels.len() + 1);

    let default_reader = readers.pop();
    for (label, reader) in labels.iter().zip(readers) {
        let label = label.as_ref().to_string();
        let classify = Arc::clone(&classify);
        let key = label.clone();
        streams.insert(key, reader.filter(move |item| classify(item) == label).boxed());
    }
    if let Some(reader) = default_reader {
        let known: Vec<String> = labels.iter().map(|l| l.as_ref().to_string()).collect();
        streams.insert(
            String::new(),
            reader
                .filter(move |item| {
                    let label = classify(item);
                    label.is_empty() || !known.iter().any(|k| k == label)
                })
                .boxed(),
        );
    }
    streams
}
