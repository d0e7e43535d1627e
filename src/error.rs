//! Error types.

use thiserror::Error;

/// An error raised while constructing a combinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum Error {
    /// A window must hold at least one item.
    #[error("window size must be greater than zero")]
    ZeroWindow,
}

/// The terminal outcome of a stream stopped by [`cancel_on`].
///
/// [`cancel_on`]: crate::stream::StreamExt::cancel_on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("stream was cancelled")]
pub struct Cancelled;
