//! Fixed-size chunking of whole texts, for replaying them as streamed input

use crate::error::{Result, SegmentError};
use rill_core::create::{from_iter, FromIter};

/// Split `text` into pieces of at most `size` bytes, never inside a code
/// point.
///
/// A piece is extended past `size` only when a single code point is wider
/// than `size`.
pub fn split_chunks(text: &str, size: usize) -> Result<Vec<String>> {
    if size == 0 {
        return Err(SegmentError::InvalidChunkSize { size });
    }

    let mut chunks = Vec::with_capacity(text.len() / size + 1);
    let mut start = 0;
    while start < text.len() {
        let mut end = (start + size).min(text.len());
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        if end == start {
            end = start + 1;
            while !text.is_char_boundary(end) {
                end += 1;
            }
        }
        chunks.push(text[start..end].to_string());
        start = end;
    }
    Ok(chunks)
}

/// A stream yielding `text` in pieces of at most `size` bytes
pub fn chunk_stream(text: &str, size: usize) -> Result<FromIter<std::vec::IntoIter<String>>> {
    Ok(from_iter(split_chunks(text, size)?))
}
