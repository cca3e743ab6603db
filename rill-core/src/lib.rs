//! Pull-based streams with shared fan-out and time-windowed batching
//!
//! Everything in this crate is built on one contract, [`Stream::recv`], which
//! yields the next item, `Ok(None)` at the end, or a terminal [`StreamError`].
//! On top of it sit:
//!
//! - per-item adapters through [`StreamExt`] (`map`, `filter`, `take_while`, ...)
//! - [`fork()`] and [`demux`]: many readers over one source, each item pulled once
//! - [`throttle`]: pairwise and batch merging within a time window
//! - [`with_buffer`]: production on a background thread through a
//!   [`ConcurrentQueue`]
//! - [`observe`]: `tracing`-based logging and tracing decorators
//! - [`text`]: re-splitting streams of string fragments
//!
//! # Example
//!
//! ```rust
//! use rill_core::{from_iter, StreamExt};
//!
//! let (left, right) = rill_core::tee(from_iter(vec!["a", "b", "c"]));
//! let upper = left.map(|s| s.to_uppercase()).try_collect().unwrap();
//! assert_eq!(upper, vec!["A", "B", "C"]);
//! assert_eq!(right.try_collect().unwrap(), vec!["a", "b", "c"]);
//! ```

pub mod adapters;
pub mod buffer;
pub mod create;
pub mod error;
pub mod ext;
pub mod fork;
pub mod observe;
pub mod queue;
pub mod safe;
pub mod stream;
pub mod text;
pub mod throttle;

pub use adapters::{concat, first_non_empty};
pub use buffer::{with_buffer, Buffered};
pub use create::{empty, from_err, from_fn, from_future_stream, from_iter, from_receiver};
pub use error::{Result, StreamError};
pub use ext::StreamExt;
pub use fork::{demux, fork, tee, ForkReader, SharedCache};
pub use observe::{StreamReport, TraceSpan};
pub use queue::ConcurrentQueue;
pub use safe::SafeStream;
pub use stream::{BoxStream, Stream, Terminal};
pub use text::{collect_string, once_string, StringReader};
pub use throttle::{throttle_merge, throttle_merge2, Clock, ManualClock, SystemClock};
