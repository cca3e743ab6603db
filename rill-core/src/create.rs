//! Stream constructors

use crate::error::{Result, StreamError};
use crate::stream::{BoxStream, Stream};
use std::fmt;
use std::marker::PhantomData;
use std::sync::mpsc::Receiver;

/// Stream backed by a `recv` closure
pub struct FromFn<F> {
    f: F,
}

impl<F> fmt::Debug for FromFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FromFn").finish_non_exhaustive()
    }
}

impl<T, F> Stream for FromFn<F>
where
    F: FnMut() -> Result<Option<T>>,
{
    type Item = T;

    fn recv(&mut self) -> Result<Option<T>> {
        (self.f)()
    }
}

/// Create a stream whose `recv` calls `f`
pub fn from_fn<T, F>(f: F) -> FromFn<F>
where
    F: FnMut() -> Result<Option<T>>,
{
    FromFn { f }
}

/// Stream over the items of an iterator
#[derive(Debug, Clone)]
pub struct FromIter<I> {
    iter: I,
}

impl<I: Iterator> Stream for FromIter<I> {
    type Item = I::Item;

    fn recv(&mut self) -> Result<Option<I::Item>> {
        Ok(self.iter.next())
    }
}

/// Create a stream that yields every item of `iter`, then ends
pub fn from_iter<I: IntoIterator>(iter: I) -> FromIter<I::IntoIter> {
    FromIter {
        iter: iter.into_iter(),
    }
}

/// Stream fed by a channel; ends when every sender is dropped
#[derive(Debug)]
pub struct FromReceiver<T> {
    rx: Receiver<T>,
}

impl<T> Stream for FromReceiver<T> {
    type Item = T;

    fn recv(&mut self) -> Result<Option<T>> {
        Ok(self.rx.recv().ok())
    }
}

/// Create a stream that blocks on `rx` for each item
pub fn from_receiver<T>(rx: Receiver<T>) -> FromReceiver<T> {
    FromReceiver { rx }
}

/// Stream that fails with the same error on every call
#[derive(Debug, Clone)]
pub struct FromErr<T> {
    err: StreamError,
    _item: PhantomData<fn() -> T>,
}

impl<T> Stream for FromErr<T> {
    type Item = T;

    fn recv(&mut self) -> Result<Option<T>> {
        Err(self.err.clone())
    }
}

/// Create a stream that only ever reports `err`
pub fn from_err<T>(err: StreamError) -> FromErr<T> {
    FromErr {
        err,
        _item: PhantomData,
    }
}

/// Stream that ends immediately
#[derive(Debug, Clone, Copy)]
pub struct Empty<T> {
    _item: PhantomData<fn() -> T>,
}

impl<T> Stream for Empty<T> {
    type Item = T;

    fn recv(&mut self) -> Result<Option<T>> {
        Ok(None)
    }
}

/// Create an empty stream
pub fn empty<T>() -> Empty<T> {
    Empty { _item: PhantomData }
}

/// Stream whose source is delivered later through a channel.
///
/// The channel is read once, on the first `recv`. If the sender is dropped
/// without delivering a stream, the result is an empty stream.
pub struct FromFuture<T> {
    pending: Option<Receiver<BoxStream<T>>>,
    src: Option<BoxStream<T>>,
}

impl<T> fmt::Debug for FromFuture<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FromFuture")
            .field("resolved", &self.pending.is_none())
            .finish()
    }
}

impl<T> Stream for FromFuture<T> {
    type Item = T;

    fn recv(&mut self) -> Result<Option<T>> {
        if let Some(rx) = self.pending.take() {
            self.src = rx.recv().ok();
        }
        match self.src.as_mut() {
            Some(src) => src.recv(),
            None => Ok(None),
        }
    }
}

/// Create a stream from a source that is still being built elsewhere.
///
/// Useful when constructing the real stream is slow: the consumer only blocks
/// on it when it first pulls.
pub fn from_future_stream<T>(rx: Receiver<BoxStream<T>>) -> FromFuture<T> {
    FromFuture {
        pending: Some(rx),
        src: None,
    }
}
