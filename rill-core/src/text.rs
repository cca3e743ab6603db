//! Helpers for streams of text fragments

use crate::error::Result;
use crate::stream::Stream;
use std::mem;

/// Accumulates string fragments and re-splits them on delimiters.
///
/// `StringReader` is itself a stream: `recv` first hands out whatever is left
/// in its buffer, then forwards the source untouched. That makes it possible
/// to read a header with [`read_until`](StringReader::read_until) and then
/// stream the rest.
#[derive(Debug)]
pub struct StringReader<S> {
    src: S,
    buffer: String,
}

impl<S> StringReader<S>
where
    S: Stream<Item = String>,
{
    pub fn new(src: S) -> Self {
        Self {
            src,
            buffer: String::new(),
        }
    }

    /// Read up to and including the earliest occurrence of any delimiter.
    ///
    /// An empty delimiter matches a single character. If the source ends
    /// before any delimiter is seen, the remaining text is returned as-is;
    /// once nothing is left the result is `Ok(None)`.
    pub fn read_until<D: AsRef<str>>(&mut self, delims: &[D]) -> Result<Option<String>> {
        loop {
            if let Some(end) = self.find_delim(delims) {
                let rest = self.buffer.split_off(end);
                return Ok(Some(mem::replace(&mut self.buffer, rest)));
            }
            match self.src.recv()? {
                Some(fragment) => self.buffer.push_str(&fragment),
                None if self.buffer.is_empty() => return Ok(None),
                None => return Ok(Some(mem::take(&mut self.buffer))),
            }
        }
    }

    /// Read one line, including its trailing `\n` if there was one
    pub fn read_line(&mut self) -> Result<Option<String>> {
        self.read_until(&["\n"])
    }

    // Byte offset just past the earliest delimiter; ties go to the first listed.
    fn find_delim<D: AsRef<str>>(&self, delims: &[D]) -> Option<usize> {
        if self.buffer.is_empty() {
            return None;
        }
        delims
            .iter()
            .filter_map(|delim| {
                let delim = delim.as_ref();
                if delim.is_empty() {
                    let first = self.buffer.chars().next()?;
                    return Some((0, first.len_utf8()));
                }
                self.buffer
                    .find(delim)
                    .map(|start| (start, start + delim.len()))
            })
            .min_by_key(|&(start, _)| start)
            .map(|(_, end)| end)
    }

    /// Turn this reader into a stream of delimiter-terminated pieces
    pub fn split<D: AsRef<str>>(self, delims: Vec<D>) -> SplitReader<S, D> {
        SplitReader {
            reader: self,
            delims,
        }
    }

    /// Turn this reader into a stream of lines
    pub fn lines(self) -> SplitReader<S, &'static str> {
        self.split(vec!["\n"])
    }

    /// Concatenate everything that is left
    pub fn collect(mut self) -> Result<String> {
        let mut out = mem::take(&mut self.buffer);
        while let Some(fragment) = self.src.recv()? {
            out.push_str(&fragment);
        }
        Ok(out)
    }
}

impl<S> Stream for StringReader<S>
where
    S: Stream<Item = String>,
{
    type Item = String;

    fn recv(&mut self) -> Result<Option<String>> {
        if !self.buffer.is_empty() {
            return Ok(Some(mem::take(&mut self.buffer)));
        }
        self.src.recv()
    }
}

/// Stream for [`StringReader::split`]
#[derive(Debug)]
pub struct SplitReader<S, D> {
    reader: StringReader<S>,
    delims: Vec<D>,
}

impl<S, D> Stream for SplitReader<S, D>
where
    S: Stream<Item = String>,
    D: AsRef<str>,
{
    type Item = String;

    fn recv(&mut self) -> Result<Option<String>> {
        self.reader.read_until(&self.delims)
    }
}

/// Block until `src` ends and return everything it produced, concatenated
pub fn collect_string<S>(src: S) -> Result<String>
where
    S: Stream<Item = String>,
{
    StringReader::new(src).collect()
}

/// Stream that yields the whole concatenated text of its source as one item
#[derive(Debug)]
pub struct OnceString<S> {
    src: Option<S>,
}

impl<S> Stream for OnceString<S>
where
    S: Stream<Item = String>,
{
    type Item = String;

    fn recv(&mut self) -> Result<Option<String>> {
        match self.src.take() {
            Some(src) => collect_string(src).map(Some),
            None => Ok(None),
        }
    }
}

/// Collapse `src` into a single item, produced once the source has ended
pub fn once_string<S>(src: S) -> OnceString<S>
where
    S: Stream<Item = String>,
{
    OnceString { src: Some(src) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::create::{from_fn, from_iter};
    use crate::error::StreamError;
    use crate::ext::StreamExt;

    fn fragments(v: &[&str]) -> impl Stream<Item = String> + Send + 'static {
        from_iter(v.iter().map(|s| s.to_string()).collect::<Vec<_>>())
    }

    #[test]
    fn test_read_line_across_fragments() {
        let mut reader = StringReader::new(fragments(&["he", "llo\nwor", "ld\n", "tail"]));
        assert_eq!(reader.read_line().unwrap().as_deref(), Some("hello\n"));
        assert_eq!(reader.read_line().unwrap().as_deref(), Some("world\n"));
        assert_eq!(reader.read_line().unwrap().as_deref(), Some("tail"));
        assert_eq!(reader.read_line().unwrap(), None);
    }

    #[test]
    fn test_earliest_delimiter_wins() {
        let mut reader = StringReader::new(fragments(&["a;b,c"]));
        assert_eq!(reader.read_until(&[",", ";"]).unwrap().as_deref(), Some("a;"));
        assert_eq!(reader.read_until(&[",", ";"]).unwrap().as_deref(), Some("b,"));
    }

    #[test]
    fn test_empty_delimiter_splits_chars() {
        let pieces = StringReader::new(fragments(&["añb"]))
            .split(vec![""])
            .try_collect()
            .unwrap();
        assert_eq!(pieces, vec!["a", "ñ", "b"]);
    }

    #[test]
    fn test_recv_drains_buffer_then_source() {
        let mut reader = StringReader::new(fragments(&["header\nbody-1", "body-2"]));
        assert_eq!(reader.read_line().unwrap().as_deref(), Some("header\n"));
        assert_eq!(reader.try_collect().unwrap(), vec!["body-1", "body-2"]);
    }

    #[test]
    fn test_lines_stream() {
        let lines = StringReader::new(fragments(&["one\ntwo", "\nthree"]))
            .lines()
            .try_collect()
            .unwrap();
        assert_eq!(lines, vec!["one\n", "two\n", "three"]);
    }

    #[test]
    fn test_collect_string() {
        assert_eq!(collect_string(fragments(&["ab", "", "cd"])).unwrap(), "abcd");
    }

    #[test]
    fn test_once_string_yields_single_item() {
        let mut s = once_string(fragments(&["x", "y", "z"]));
        assert_eq!(s.recv().unwrap().as_deref(), Some("xyz"));
        assert_eq!(s.recv().unwrap(), None);
    }

    #[test]
    fn test_read_until_propagates_error() {
        let mut calls = 0;
        let src = from_fn(move || {
            calls += 1;
            if calls == 1 {
                Ok(Some("partial".to_string()))
            } else {
                Err(StreamError::msg("reset"))
            }
        });
        let mut reader = StringReader::new(src);
        assert!(reader.read_line().is_err());
    }
}
