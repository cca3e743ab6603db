//! The pull contract every operator implements

use crate::error::{Result, StreamError};

/// A pull-based sequence producer.
///
/// Each call to [`recv`](Stream::recv) yields one of:
/// - `Ok(Some(item))`: the next item
/// - `Ok(None)`: normal end of stream
/// - `Err(err)`: a terminal failure, surfaced without retry
///
/// After the first `Ok(None)` or `Err(_)` a well-behaved stream keeps
/// reporting that same terminal outcome.
pub trait Stream {
    /// Item type produced by this stream
    type Item;

    /// Pull the next item
    fn recv(&mut self) -> Result<Option<Self::Item>>;
}

impl<S: Stream + ?Sized> Stream for Box<S> {
    type Item = S::Item;

    fn recv(&mut self) -> Result<Option<Self::Item>> {
        (**self).recv()
    }
}

impl<S: Stream + ?Sized> Stream for &mut S {
    type Item = S::Item;

    fn recv(&mut self) -> Result<Option<Self::Item>> {
        (**self).recv()
    }
}

/// Type-erased stream that can move between threads
pub type BoxStream<T> = Box<dyn Stream<Item = T> + Send>;

/// A recorded terminal outcome, replayable any number of times
#[derive(Debug, Clone)]
pub enum Terminal {
    /// The source ended normally
    End,
    /// The source failed
    Failed(StreamError),
}

impl Terminal {
    /// Classify a `recv` outcome; `None` when it carried an item
    pub fn of<T>(outcome: &Result<Option<T>>) -> Option<Terminal> {
        match outcome {
            Ok(Some(_)) => None,
            Ok(None) => Some(Terminal::End),
            Err(err) => Some(Terminal::Failed(err.clone())),
        }
    }

    /// Report this outcome again
    pub fn replay<T>(&self) -> Result<Option<T>> {
        match self {
            Terminal::End => Ok(None),
            Terminal::Failed(err) => Err(err.clone()),
        }
    }
}

/// Iterator over a stream's items, stopping after the first terminal outcome
#[derive(Debug)]
pub struct Iter<S> {
    stream: S,
    done: bool,
}

impl<S> Iter<S> {
    pub(crate) fn new(stream: S) -> Self {
        Self {
            stream,
            done: false,
        }
    }
}

impl<S: Stream> Iterator for Iter<S> {
    type Item = Result<S::Item>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.stream.recv() {
            Ok(Some(item)) => Some(Ok(item)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}
