//! Stream error types

use std::error::Error as StdError;
use std::sync::Arc;
use thiserror::Error;

/// Shared, type-erased upstream failure
pub type SharedError = Arc<dyn StdError + Send + Sync + 'static>;

/// Terminal failure observed by a stream consumer.
///
/// End-of-stream is not an error: it is reported as `Ok(None)` from
/// [`Stream::recv`](crate::Stream::recv). Errors are cheap to clone so a cached
/// terminal outcome can be replayed to every reader of a fork.
#[derive(Error, Debug, Clone)]
pub enum StreamError {
    /// Failure reported by an upstream source, forwarded verbatim
    #[error(transparent)]
    Upstream(SharedError),

    /// The background producer went away without reporting a terminal outcome
    #[error("stream producer terminated before reaching the end of its source")]
    ProducerLost,
}

impl StreamError {
    /// Wrap any error as an upstream failure
    pub fn upstream<E>(err: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        StreamError::Upstream(Arc::new(err))
    }

    /// Build an upstream failure from a message
    pub fn msg(message: impl Into<String>) -> Self {
        let boxed: Box<dyn StdError + Send + Sync> = message.into().into();
        StreamError::Upstream(Arc::from(boxed))
    }

    /// Recover the concrete upstream error, if it has type `E`
    pub fn downcast_ref<E>(&self) -> Option<&E>
    where
        E: StdError + 'static,
    {
        match self {
            StreamError::Upstream(inner) => inner.downcast_ref::<E>(),
            StreamError::ProducerLost => None,
        }
    }

    /// Whether two errors are the same cached failure
    pub fn same_as(&self, other: &StreamError) -> bool {
        match (self, other) {
            (StreamError::Upstream(a), StreamError::Upstream(b)) => Arc::ptr_eq(a, b),
            (StreamError::ProducerLost, StreamError::ProducerLost) => true,
            _ => false,
        }
    }
}

/// Result type for stream operations
pub type Result<T> = std::result::Result<T, StreamError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt;

    #[derive(Debug, PartialEq)]
    struct Timeout(u32);

    impl fmt::Display for Timeout {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "timed out after {}ms", self.0)
        }
    }

    impl StdError for Timeout {}

    #[test]
    fn test_upstream_display_is_verbatim() {
        let err = StreamError::upstream(Timeout(250));
        assert_eq!(err.to_string(), "timed out after 250ms");
    }

    #[test]
    fn test_downcast_recovers_original() {
        let err = StreamError::upstream(Timeout(10));
        assert_eq!(err.downcast_ref::<Timeout>(), Some(&Timeout(10)));
        assert!(StreamError::ProducerLost.downcast_ref::<Timeout>().is_none());
    }

    #[test]
    fn test_msg_error() {
        let err = StreamError::msg("connection reset");
        assert_eq!(err.to_string(), "connection reset");
    }

    #[test]
    fn test_clones_are_the_same_failure() {
        let err = StreamError::msg("boom");
        let replay = err.clone();
        assert!(err.same_as(&replay));
        assert!(!err.same_as(&StreamError::msg("boom")));
        assert!(StreamError::ProducerLost.same_as(&StreamError::ProducerLost));
    }
}
