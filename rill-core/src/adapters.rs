//! Per-item adapters
//!
//! None of these hold interesting state: they apply a function per item and
//! forward upstream errors unchanged.

use crate::error::Result;
use crate::stream::{BoxStream, Stream};
use std::collections::VecDeque;
use std::fmt;

/// Stream for [`StreamExt::map`](crate::StreamExt::map)
pub struct Map<S, F> {
    src: S,
    f: F,
}

impl<S, F> Map<S, F> {
    pub(crate) fn new(src: S, f: F) -> Self {
        Self { src, f }
    }
}

impl<S: fmt::Debug, F> fmt::Debug for Map<S, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Map").field("src", &self.src).finish()
    }
}

impl<S, F, R> Stream for Map<S, F>
where
    S: Stream,
    F: FnMut(S::Item) -> R,
{
    type Item = R;

    fn recv(&mut self) -> Result<Option<R>> {
        Ok(self.src.recv()?.map(&mut self.f))
    }
}

/// Stream for [`StreamExt::map_result`](crate::StreamExt::map_result)
pub struct MapResult<S, F> {
    src: S,
    f: F,
}

impl<S, F> MapResult<S, F> {
    pub(crate) fn new(src: S, f: F) -> Self {
        Self { src, f }
    }
}

impl<S, F, R> Stream for MapResult<S, F>
where
    S: Stream,
    F: FnMut(Result<Option<S::Item>>) -> Result<Option<R>>,
{
    type Item = R;

    fn recv(&mut self) -> Result<Option<R>> {
        (self.f)(self.src.recv())
    }
}

/// Stream for [`StreamExt::filter`](crate::StreamExt::filter)
pub struct Filter<S, P> {
    src: S,
    predicate: P,
}

impl<S, P> Filter<S, P> {
    pub(crate) fn new(src: S, predicate: P) -> Self {
        Self { src, predicate }
    }
}

impl<S, P> Stream for Filter<S, P>
where
    S: Stream,
    P: FnMut(&S::Item) -> bool,
{
    type Item = S::Item;

    fn recv(&mut self) -> Result<Option<S::Item>> {
        while let Some(item) = self.src.recv()? {
            if (self.predicate)(&item) {
                return Ok(Some(item));
            }
        }
        Ok(None)
    }
}

/// Sequential concatenation of several streams
pub struct Concat<T> {
    streams: VecDeque<BoxStream<T>>,
    first_non_empty: bool,
    yielded: bool,
}

impl<T> fmt::Debug for Concat<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Concat")
            .field("remaining", &self.streams.len())
            .field("first_non_empty", &self.first_non_empty)
            .finish()
    }
}

impl<T> Stream for Concat<T> {
    type Item = T;

    fn recv(&mut self) -> Result<Option<T>> {
        while let Some(current) = self.streams.front_mut() {
            match current.recv()? {
                Some(item) => {
                    self.yielded = true;
                    return Ok(Some(item));
                }
                None if self.first_non_empty && self.yielded => {
                    self.streams.clear();
                }
                None => {
                    self.streams.pop_front();
                }
            }
        }
        Ok(None)
    }
}

/// Drain each stream in turn until all have ended
pub fn concat<T>(streams: impl IntoIterator<Item = BoxStream<T>>) -> Concat<T> {
    Concat {
        streams: streams.into_iter().collect(),
        first_non_empty: false,
        yielded: false,
    }
}

/// Yield the first stream that produces anything, and only that one.
///
/// Streams are not read concurrently: the next stream is only tried once the
/// current one ends without yielding.
pub fn first_non_empty<T>(streams: impl IntoIterator<Item = BoxStream<T>>) -> Concat<T> {
    Concat {
        streams: streams.into_iter().collect(),
        first_non_empty: true,
        yielded: false,
    }
}

/// Stream for [`StreamExt::skip_until`](crate::StreamExt::skip_until)
pub struct SkipUntil<S, P> {
    src: S,
    predicate: P,
    found: bool,
}

impl<S, P> SkipUntil<S, P> {
    pub(crate) fn new(src: S, predicate: P) -> Self {
        Self {
            src,
            predicate,
            found: false,
        }
    }
}

impl<S, P> Stream for SkipUntil<S, P>
where
    S: Stream,
    P: FnMut(&S::Item) -> bool,
{
    type Item = S::Item;

    fn recv(&mut self) -> Result<Option<S::Item>> {
        if self.found {
            return self.src.recv();
        }
        while let Some(item) = self.src.recv()? {
            if (self.predicate)(&item) {
                self.found = true;
                return Ok(Some(item));
            }
        }
        Ok(None)
    }
}

/// Stream for [`StreamExt::skip_n`](crate::StreamExt::skip_n)
#[derive(Debug)]
pub struct SkipN<S> {
    src: S,
    remaining: usize,
}

impl<S> SkipN<S> {
    pub(crate) fn new(src: S, n: usize) -> Self {
        Self { src, remaining: n }
    }
}

impl<S: Stream> Stream for SkipN<S> {
    type Item = S::Item;

    fn recv(&mut self) -> Result<Option<S::Item>> {
        while self.remaining > 0 {
            if self.src.recv()?.is_none() {
                return Ok(None);
            }
            self.remaining -= 1;
        }
        self.src.recv()
    }
}

/// Stream for [`StreamExt::take_while`](crate::StreamExt::take_while)
pub struct TakeWhile<S, P> {
    src: S,
    predicate: P,
    ended: bool,
}

impl<S, P> TakeWhile<S, P> {
    pub(crate) fn new(src: S, predicate: P) -> Self {
        Self {
            src,
            predicate,
            ended: false,
        }
    }
}

impl<S, P> Stream for TakeWhile<S, P>
where
    S: Stream,
    P: FnMut(&S::Item) -> bool,
{
    type Item = S::Item;

    fn recv(&mut self) -> Result<Option<S::Item>> {
        if self.ended {
            return Ok(None);
        }
        match self.src.recv()? {
            Some(item) if (self.predicate)(&item) => Ok(Some(item)),
            _ => {
                self.ended = true;
                Ok(None)
            }
        }
    }
}

/// Stream for [`StreamExt::on_eof`](crate::StreamExt::on_eof)
pub struct OnEof<S, F> {
    src: S,
    hook: Option<F>,
}

impl<S, F> OnEof<S, F> {
    pub(crate) fn new(src: S, hook: F) -> Self {
        Self {
            src,
            hook: Some(hook),
        }
    }
}

impl<S, F> Stream for OnEof<S, F>
where
    S: Stream,
    F: FnOnce(),
{
    type Item = S::Item;

    fn recv(&mut self) -> Result<Option<S::Item>> {
        let outcome = self.src.recv();
        if matches!(outcome, Ok(None)) {
            if let Some(hook) = self.hook.take() {
                hook();
            }
        }
        outcome
    }
}

/// Stream for [`StreamExt::substitute`](crate::StreamExt::substitute)
///
/// Once `replace` returns a stream, the original is dropped together with any
/// items it had not yet produced and `replace` is never called again.
pub struct Substitute<T, F> {
    src: BoxStream<T>,
    replace: Option<F>,
}

impl<T, F> Substitute<T, F> {
    pub(crate) fn new(src: BoxStream<T>, replace: F) -> Self {
        Self {
            src,
            replace: Some(replace),
        }
    }
}

impl<T, F> Stream for Substitute<T, F>
where
    F: FnMut(&T) -> Option<BoxStream<T>>,
{
    type Item = T;

    fn recv(&mut self) -> Result<Option<T>> {
        let Some(item) = self.src.recv()? else {
            return Ok(None);
        };
        let Some(replace) = self.replace.as_mut() else {
            return Ok(Some(item));
        };
        match replace(&item) {
            Some(replacement) => {
                self.src = replacement;
                self.replace = None;
                self.src.recv()
            }
            None => Ok(Some(item)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::create::{empty, from_err, from_iter};
    use crate::error::StreamError;
    use crate::ext::StreamExt;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn ints(v: &[i32]) -> BoxStream<i32> {
        from_iter(v.to_vec()).boxed()
    }

    #[test]
    fn test_map_and_filter() {
        let out = ints(&[1, 2, 3, 4])
            .filter(|n| n % 2 == 0)
            .map(|n| n * 10)
            .try_collect()
            .unwrap();
        assert_eq!(out, vec![20, 40]);
    }

    #[test]
    fn test_map_result_sees_terminal() {
        let out = ints(&[1])
            .map_result(|r| match r {
                Ok(None) => Ok(Some(-1)),
                other => other,
            })
            .take_while(|n| *n != -1)
            .try_collect()
            .unwrap();
        assert_eq!(out, vec![1]);
    }

    #[test]
    fn test_concat_skips_empty_streams() {
        let s = concat(vec![empty().boxed(), ints(&[1]), empty().boxed(), ints(&[2, 3])]);
        assert_eq!(s.try_collect().unwrap(), vec![1, 2, 3]);
        assert_eq!(concat::<i32>(Vec::new()).try_collect().unwrap(), Vec::<i32>::new());
    }

    #[test]
    fn test_first_non_empty() {
        let s = first_non_empty(vec![ints(&[]), ints(&[3, 4]), ints(&[5])]);
        assert_eq!(s.try_collect().unwrap(), vec![3, 4]);

        let s = first_non_empty(vec![empty().boxed(), ints(&[1]), empty().boxed(), ints(&[2, 3])]);
        assert_eq!(s.try_collect().unwrap(), vec![1]);
    }

    #[test]
    fn test_concat_propagates_error() {
        let s = concat(vec![ints(&[1]), from_err(StreamError::msg("broken")).boxed(), ints(&[2])]);
        let err = s.try_collect().unwrap_err();
        assert_eq!(err.to_string(), "broken");
    }

    #[test]
    fn test_skip_until() {
        let out = ints(&[1, 2, 3, 4, 5]).skip_until(|n| *n == 3).try_collect().unwrap();
        assert_eq!(out, vec![3, 4, 5]);

        let out = ints(&[1, 2]).skip_until(|n| *n == 9).try_collect().unwrap();
        assert!(out.is_empty());

        let out = ints(&[1, 2]).skip_until(|n| *n == 1).try_collect().unwrap();
        assert_eq!(out, vec![1, 2]);
    }

    #[test]
    fn test_skip_n() {
        let data = ["a", "b", "c", "d", "e"];
        assert_eq!(from_iter(data).skip_n(0).try_collect().unwrap().len(), 5);
        assert_eq!(from_iter(data).skip_n(2).try_collect().unwrap(), vec!["c", "d", "e"]);
        assert!(from_iter(data).skip_n(5).try_collect().unwrap().is_empty());
        assert!(from_iter(data).skip_n(10).try_collect().unwrap().is_empty());
    }

    #[test]
    fn test_take_while_drops_first_failing_item() {
        let out = ints(&[2, 4, 6, 7, 8, 10]).take_while(|n| n % 2 == 0).try_collect().unwrap();
        assert_eq!(out, vec![2, 4, 6]);

        let out = ints(&[1, 2, 3]).take_while(|_| false).try_collect().unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_take_while_propagates_error() {
        let s = from_err::<i32>(StreamError::msg("test error")).take_while(|_| true);
        assert_eq!(s.try_collect().unwrap_err().to_string(), "test error");
    }

    #[test]
    fn test_on_eof_runs_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = calls.clone();
        let mut s = ints(&[1]).on_eof(move || {
            seen.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(s.recv().unwrap(), Some(1));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(s.recv().unwrap(), None);
        assert_eq!(s.recv().unwrap(), None);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_substitute_replaces_rest_of_stream() {
        let s = ints(&[1, 2, 3]).substitute(|n| (*n == 2).then(|| ints(&[20, 21, 22])));
        assert_eq!(s.try_collect().unwrap(), vec![1, 20, 21, 22]);

        let s = ints(&[1, 2, 3]).substitute(|n| (*n == 1).then(|| ints(&[10, 11])));
        assert_eq!(s.try_collect().unwrap(), vec![10, 11]);
    }

    #[test]
    fn test_substitute_error_paths() {
        let s = from_err::<i32>(StreamError::msg("test error")).substitute(|_| None);
        assert_eq!(s.try_collect().unwrap_err().to_string(), "test error");

        let mut s = ints(&[1, 2, 3])
            .substitute(|n| (*n == 2).then(|| from_err(StreamError::msg("replacement error")).boxed()));
        assert_eq!(s.recv().unwrap(), Some(1));
        assert_eq!(s.recv().unwrap_err().to_string(), "replacement error");
    }
}
