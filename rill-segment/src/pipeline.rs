//! Assembles a segmentation pipeline from a [`SegmentConfig`]
//!
//! Stages run in this order, each optional:
//! remove-token, label or special-token engine, throttle, buffer.

use crate::chunk::{coalesce, LabeledChunk};
use crate::config::{SegmentConfig, ThrottleMode};
use crate::error::Result;
use crate::label::{split_text, LabelStream};
use crate::remove_token::RemoveTokens;
use crate::special_token::SpecialTokenStream;
use rill_core::{BoxStream, Stream, StreamExt};
use std::collections::HashMap;
use tracing::debug;

/// Build the configured pipeline over `src`.
///
/// Without labels or special tokens the text passes through as unlabeled
/// chunks.
pub fn segment<S>(src: S, config: &SegmentConfig) -> Result<BoxStream<LabeledChunk>>
where
    S: Stream<Item = String> + Send + 'static,
{
    config.validate()?;
    debug!(
        labels = config.labels.len(),
        special_tokens = config.special_tokens.len(),
        remove_tokens = config.remove_tokens.len(),
        throttled = config.throttle.is_some(),
        buffered = config.buffered,
        "building segmentation pipeline"
    );

    let text = RemoveTokens::new(src, &config.remove_tokens);
    let chunks: BoxStream<LabeledChunk> = if !config.labels.is_empty() {
        LabelStream::new(text, config.labels.clone())?.boxed()
    } else if !config.special_tokens.is_empty() {
        SpecialTokenStream::new(text, config.special_tokens.clone())?.boxed()
    } else {
        text.map(|chunk| LabeledChunk::new("", chunk)).boxed()
    };

    let chunks = match &config.throttle {
        None => chunks,
        Some(throttle) => match throttle.mode {
            ThrottleMode::Pairwise => chunks
                .throttle_merge(|a: &LabeledChunk, b: &LabeledChunk| a.merge(b), throttle.window())
                .boxed(),
            ThrottleMode::Batch => chunks.throttle_merge2(coalesce, throttle.window()).boxed(),
        },
    };

    if config.buffered {
        Ok(chunks.with_buffer().boxed())
    } else {
        Ok(chunks)
    }
}

/// Build the configured pipeline and split it into one text stream per
/// label or special token, plus `""` for everything else.
///
/// Every returned stream must be drained, or all of them dropped.
pub fn segment_demux<S>(src: S, config: &SegmentConfig) -> Result<HashMap<String, BoxStream<String>>>
where
    S: Stream<Item = String> + Send + 'static,
{
    let chunks = segment(src, config)?;
    Ok(split_text(chunks, &config.stream_names()))
}
