use super::{Buffered, WindowSize};
use crate::utils::InFlight;
use crate::Error;

use core::fmt;
use core::future::Future;
use core::pin::Pin;
use core::task::{Context, Poll};
use futures_core::stream::{FusedStream, Stream};
use pin_project::pin_project;

/// Run up to `window` futures from a stream concurrently, yielding each
/// output as soon as its future finishes.
///
/// Output order is not guaranteed. Use [`ordered`] to get a [`Buffered`] over
/// the same source and window size.
///
/// This `struct` is created by [`BufferedUnordered::new`], [`Buffered::unordered`]
/// or the [`buffered_unordered`] method on [`StreamExt`]. See its
/// documentation for more.
///
/// # Examples
///
/// ```
/// use futures_pipelining::prelude::*;
/// use futures_lite::{future::block_on, stream, StreamExt};
/// use std::future::ready;
///
/// block_on(async {
///     let source = stream::iter(vec![ready(1), ready(2), ready(3)]);
///     let mut out: Vec<_> = source
///         .buffered_unordered(2)
///         .unwrap()
///         .into_stream()
///         .collect()
///         .await;
///     out.sort_unstable();
///     assert_eq!(out, vec![1, 2, 3]);
/// })
/// ```
///
/// [`ordered`]: BufferedUnordered::ordered
/// [`buffered_unordered`]: crate::stream::StreamExt::buffered_unordered
/// [`StreamExt`]: crate::stream::StreamExt
#[derive(Debug, Clone)]
#[must_use = "`BufferedUnordered` does nothing until turned into a stream"]
pub struct BufferedUnordered<S> {
    source: S,
    window: WindowSize,
}

impl<S> BufferedUnordered<S> {
    /// Create a new `BufferedUnordered`, failing if `window` is zero.
    pub fn new(source: S, window: usize) -> Result<Self, Error> {
        Ok(Self::with_window(source, WindowSize::new(window)?))
    }

    /// Create a new `BufferedUnordered` from an already validated window size.
    pub fn with_window(source: S, window: WindowSize) -> Self {
        Self { source, window }
    }

    /// Returns the window size.
    pub fn window(&self) -> WindowSize {
        self.window
    }

    /// Returns a reference to the source stream.
    pub fn get_ref(&self) -> &S {
        &self.source
    }

    /// Consumes the descriptor, returning the source stream.
    pub fn into_inner(self) -> S {
        self.source
    }

    /// Yield outputs in pull order again.
    ///
    /// Only affects iterations started from the returned descriptor.
    pub fn ordered(self) -> Buffered<S> {
        Buffered::with_window(self.source, self.window)
    }
}

impl<S> BufferedUnordered<S>
where
    S: Stream,
    S::Item: Future,
{
    /// Start iterating, consuming the descriptor.
    pub fn into_stream(self) -> BufferedUnorderedStream<S> {
        BufferedUnorderedStream::new(self.source, self.window)
    }

    /// Start an independent iteration over a clone of the source.
    pub fn stream(&self) -> BufferedUnorderedStream<S>
    where
        S: Clone,
    {
        BufferedUnorderedStream::new(self.source.clone(), self.window)
    }
}

/// The stream returned by [`BufferedUnordered::into_stream`] and
/// [`BufferedUnordered::stream`].
#[pin_project]
#[must_use = "streams do nothing unless polled or .awaited"]
pub struct BufferedUnorderedStream<S>
where
    S: Stream,
    S::Item: Future,
{
    #[pin]
    source: Option<S>,
    in_flight: InFlight<S::Item>,
    window: WindowSize,
}

impl<S> BufferedUnorderedStream<S>
where
    S: Stream,
    S::Item: Future,
{
    pub(crate) fn new(source: S, window: WindowSize) -> Self {
        Self {
            source: Some(source),
            in_flight: InFlight::with_capacity(window.get()),
            window,
        }
    }

    /// Number of items pulled from the source but not yet yielded.
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }
}

impl<S> fmt::Debug for BufferedUnorderedStream<S>
where
    S: Stream,
    S::Item: Future,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BufferedUnorderedStream")
            .field("window", &self.window)
            .field("in_flight", &self.in_flight.len())
            .field("exhausted", &self.source.is_none())
            .finish_non_exhaustive()
    }
}

impl<S> Stream for BufferedUnorderedStream<S>
where
    S: Stream,
    S::Item: Future,
{
    type Item = <S::Item as Future>::Output;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();

        while this.in_flight.len() < this.window.get() {
            let Some(source) = this.source.as_mut().as_pin_mut() else {
                break;
            };
            match source.poll_next(cx) {
                Poll::Ready(Some(future)) => {
                    // Anything that's already done can skip the window.
                    let mut future = Box::pin(future);
                    if let Poll::Ready(output) = future.as_mut().poll(cx) {
                        tracing::trace!("buffered_unordered: item ready on arrival");
                        return Poll::Ready(Some(output));
                    }
                    this.in_flight.insert(future);
                }
                Poll::Ready(None) => {
                    tracing::trace!("buffered_unordered: source exhausted");
                    this.source.set(None);
                }
                Poll::Pending => break,
            }
        }

        match this.in_flight.poll_next(cx) {
            Poll::Ready(Some(output)) => Poll::Ready(Some(output)),
            Poll::Ready(None) if this.source.is_none() => Poll::Ready(None),
            Poll::Ready(None) | Poll::Pending => Poll::Pending,
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let queued = self.in_flight.len();
        match &self.source {
            Some(source) => {
                let (lower, upper) = source.size_hint();
                (
                    lower.saturating_add(queued),
                    upper.and_then(|upper| upper.checked_add(queued)),
                )
            }
            None => (queued, Some(queued)),
        }
    }
}

impl<S> FusedStream for BufferedUnorderedStream<S>
where
    S: Stream,
    S::Item: Future,
{
    fn is_terminated(&self) -> bool {
        self.source.is_none() && self.in_flight.is_empty()
    }
}
