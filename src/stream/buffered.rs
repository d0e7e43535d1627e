use super::{BufferedUnordered, WindowSize};
use crate::utils::InFlight;
use crate::Error;

use core::fmt;
use core::future::Future;
use core::pin::Pin;
use core::task::{Context, Poll};
use futures_core::stream::{FusedStream, Stream};
use futures_lite::ready;
use pin_project::pin_project;
use std::collections::BTreeMap;

/// Run up to `window` futures from a stream concurrently, yielding their
/// outputs in the order the futures were pulled from the stream.
///
/// `Buffered` is a description of the work: it holds the source stream and
/// the window size. Call [`into_stream`] to start iterating, or [`stream`] to
/// get a fresh, independent iteration from a cloneable source.
///
/// This `struct` is created by [`Buffered::new`] or the [`buffered`] method
/// on [`StreamExt`]. See its documentation for more.
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
///     let out: Vec<_> = source.buffered(2).unwrap().into_stream().collect().await;
///     assert_eq!(out, vec![1, 2, 3]);
/// })
/// ```
///
/// [`into_stream`]: Buffered::into_stream
/// [`stream`]: Buffered::stream
/// [`buffered`]: crate::stream::StreamExt::buffered
/// [`StreamExt`]: crate::stream::StreamExt
#[derive(Debug, Clone)]
#[must_use = "`Buffered` does nothing until turned into a stream"]
pub struct Buffered<S> {
    source: S,
    window: WindowSize,
}

impl<S> Buffered<S> {
    /// Create a new `Buffered`, failing if `window` is zero.
    pub fn new(source: S, window: usize) -> Result<Self, Error> {
        Ok(Self::with_window(source, WindowSize::new(window)?))
    }

    /// Create a new `Buffered` from an already validated window size.
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

    /// Yield outputs as soon as they're ready instead of in pull order.
    ///
    /// The source and window size are carried over unchanged.
    pub fn unordered(self) -> BufferedUnordered<S> {
        BufferedUnordered::with_window(self.source, self.window)
    }
}

impl<S> Buffered<S>
where
    S: Stream,
    S::Item: Future,
{
    /// Start iterating, consuming the descriptor.
    pub fn into_stream(self) -> BufferedStream<S> {
        BufferedStream::new(self.source, self.window)
    }

    /// Start an independent iteration over a clone of the source.
    pub fn stream(&self) -> BufferedStream<S>
    where
        S: Clone,
    {
        BufferedStream::new(self.source.clone(), self.window)
    }
}

/// A future tagged with the position it was pulled from the source at.
#[pin_project]
struct Sequenced<F> {
    #[pin]
    future: F,
    seq: u64,
}

impl<F: Future> Future for Sequenced<F> {
    type Output = (u64, F::Output);

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.project();
        let output = ready!(this.future.poll(cx));
        Poll::Ready((*this.seq, output))
    }
}

/// The stream returned by [`Buffered::into_stream`] and [`Buffered::stream`].
#[pin_project]
#[must_use = "streams do nothing unless polled or .awaited"]
pub struct BufferedStream<S>
where
    S: Stream,
    S::Item: Future,
{
    #[pin]
    source: Option<S>,
    in_flight: InFlight<Sequenced<S::Item>>,
    // Outputs which finished ahead of their turn. They still occupy a slot.
    completed: BTreeMap<u64, <S::Item as Future>::Output>,
    window: WindowSize,
    next_seq: u64,
    next_out: u64,
}

impl<S> BufferedStream<S>
where
    S: Stream,
    S::Item: Future,
{
    pub(crate) fn new(source: S, window: WindowSize) -> Self {
        Self {
            source: Some(source),
            in_flight: InFlight::with_capacity(window.get()),
            completed: BTreeMap::new(),
            window,
            next_seq: 0,
            next_out: 0,
        }
    }

    /// Number of items pulled from the source but not yet yielded.
    pub fn in_flight(&self) -> usize {
        self.in_flight.len() + self.completed.len()
    }
}

impl<S> fmt::Debug for BufferedStream<S>
where
    S: Stream,
    S::Item: Future,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BufferedStream")
            .field("window", &self.window)
            .field("in_flight", &self.in_flight())
            .field("exhausted", &self.source.is_none())
            .finish_non_exhaustive()
    }
}

impl<S> Stream for BufferedStream<S>
where
    S: Stream,
    S::Item: Future,
{
    type Item = <S::Item as Future>::Output;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();

        loop {
            // Top the window up from the source.
            while this.in_flight.len() + this.completed.len() < this.window.get() {
                let Some(source) = this.source.as_mut().as_pin_mut() else {
                    break;
                };
                match source.poll_next(cx) {
                    Poll::Ready(Some(future)) => {
                        let seq = *this.next_seq;
                        *this.next_seq += 1;
                        let mut future = Box::pin(Sequenced { future, seq });

                        // With nothing queued ahead of it this item is next in
                        // line, so if it's already done there's no need to
                        // buffer it.
                        if this.in_flight.is_empty() && this.completed.is_empty() {
                            if let Poll::Ready((_, output)) = future.as_mut().poll(cx) {
                                tracing::trace!(seq, "buffered: item ready on arrival");
                                *this.next_out += 1;
                                return Poll::Ready(Some(output));
                            }
                        }
                        this.in_flight.insert(future);
                    }
                    Poll::Ready(None) => {
                        tracing::trace!(pulled = *this.next_seq, "buffered: source exhausted");
                        this.source.set(None);
                    }
                    Poll::Pending => break,
                }
            }

            if let Some(output) = this.completed.remove(&*this.next_out) {
                *this.next_out += 1;
                return Poll::Ready(Some(output));
            }

            match this.in_flight.poll_next(cx) {
                Poll::Ready(Some((seq, output))) if seq == *this.next_out => {
                    *this.next_out += 1;
                    return Poll::Ready(Some(output));
                }
                Poll::Ready(Some((seq, output))) => {
                    this.completed.insert(seq, output);
                }
                Poll::Ready(None) if this.source.is_none() => return Poll::Ready(None),
                Poll::Ready(None) | Poll::Pending => return Poll::Pending,
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let queued = self.in_flight();
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

impl<S> FusedStream for BufferedStream<S>
where
    S: Stream,
    S::Item: Future,
{
    fn is_terminated(&self) -> bool {
        self.source.is_none() && self.in_flight() == 0
    }
}
