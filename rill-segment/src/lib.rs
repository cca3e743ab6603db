//! Incremental segmentation of chunked text streams
//!
//! Text arrives as a [`Stream`](rill_core::Stream) of arbitrary fragments,
//! for example streamed model output. The engines in this crate recognise
//! tokens that may be split across fragments and produce the same result
//! however the input was chunked:
//!
//! - [`LabelStream`]: regions opened and closed by start/end tokens
//! - [`SpecialTokenStream`]: reusable markers that retag following text
//! - [`RemoveTokens`]: drop tokens from the text
//!
//! [`pipeline::segment`] chains them from a [`SegmentConfig`].
//!
//! # Example
//!
//! ```rust
//! use rill_core::{collect_string, from_iter};
//! use rill_segment::{Label, LabelStream};
//!
//! let src = from_iter(vec!["<q>wh".to_string(), "y?</".to_string(), "q>".to_string()]);
//! let labels = vec![Label::new("question", "<q>", "</q>")];
//! let mut split = LabelStream::new(src, labels).unwrap().demux();
//!
//! let question = split.remove("question").unwrap();
//! let rest = split.remove("").unwrap();
//! assert_eq!(collect_string(question).unwrap(), "why?");
//! assert_eq!(collect_string(rest).unwrap(), "</q>");
//! ```

pub mod chunk;
pub mod chunker;
pub mod config;
pub mod engine;
pub mod error;
pub mod label;
pub mod pipeline;
pub mod remove_token;
pub mod residual;
pub mod special_token;

pub use chunk::{coalesce, Label, LabeledChunk};
pub use chunker::{chunk_stream, split_chunks};
pub use config::{SegmentConfig, ThrottleConfig, ThrottleMode};
pub use engine::{CutPolicy, Segmenter};
pub use error::{Result, SegmentError};
pub use label::{split_text, LabelStream};
pub use pipeline::{segment, segment_demux};
pub use remove_token::{remove_labels, remove_tokens, RemoveTokens};
pub use residual::{ResidualBuffer, Search};
pub use special_token::SpecialTokenStream;
