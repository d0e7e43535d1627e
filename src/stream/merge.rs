use crate::utils::WakerVec;

use core::fmt;
use core::pin::Pin;
use core::task::{Context, Poll};
use futures_core::stream::{FusedStream, Stream};
use slab::Slab;

/// Combines multiple streams into a single stream of all their outputs.
///
/// Items are yielded as soon as they're received, and the stream continues
/// to yield until every source has been exhausted. The output ordering
/// between streams is not guaranteed. A source is dropped as soon as it
/// reports exhaustion; dropping the merged stream drops every source which is
/// still open.
///
/// This `struct` is created by the [`merge`] and [`merge_all`] functions, by
/// collecting an iterator of streams, or by the [`merge`][ext] method on
/// [`StreamExt`]. See their documentation for more.
///
/// # Examples
///
/// ```
/// use futures_pipelining::stream::merge_all;
/// use futures_lite::stream::{self, StreamExt};
/// use futures_lite::future::block_on;
///
/// block_on(async {
///     let a = stream::once(1);
///     let b = stream::once(2);
///     let c = stream::once(3);
///     let mut s = merge_all([a, b, c]).into_stream();
///
///     let mut buf = vec![];
///     while let Some(n) = s.next().await {
///         buf.push(n);
///     }
///     buf.sort_unstable();
///     assert_eq!(&buf, &[1, 2, 3]);
/// })
/// ```
///
/// [ext]: crate::stream::StreamExt::merge
/// [`StreamExt`]: crate::stream::StreamExt
#[derive(Debug, Clone)]
#[must_use = "`Merge` does nothing until turned into a stream"]
pub struct Merge<S> {
    sources: Vec<S>,
}

impl<S> Merge<S> {
    /// Create a new `Merge` over `sources`.
    pub fn new(sources: Vec<S>) -> Self {
        Self { sources }
    }

    /// Returns the number of sources.
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Returns `true` if there are no sources to merge.
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Consumes the descriptor, returning the sources.
    pub fn into_inner(self) -> Vec<S> {
        self.sources
    }
}

impl<S: Stream> Merge<S> {
    /// Start iterating, consuming the descriptor.
    pub fn into_stream(self) -> MergeStream<S> {
        MergeStream::new(self.sources)
    }

    /// Start an independent iteration over clones of the sources.
    pub fn stream(&self) -> MergeStream<S>
    where
        S: Clone,
    {
        MergeStream::new(self.sources.clone())
    }
}

impl<S> FromIterator<S> for Merge<S> {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Merge `first` with every stream in `others`.
///
/// # Examples
///
/// ```
/// use futures_pipelining::stream::merge;
/// use futures_lite::{future::block_on, stream, StreamExt};
///
/// block_on(async {
///     let s = merge(stream::iter(vec![1, 2]), [stream::iter(vec![3])]);
///     let mut out: Vec<_> = s.into_stream().collect().await;
///     out.sort_unstable();
///     assert_eq!(out, vec![1, 2, 3]);
/// })
/// ```
pub fn merge<S, I>(first: S, others: I) -> Merge<S>
where
    I: IntoIterator<Item = S>,
{
    core::iter::once(first).chain(others).collect()
}

/// Merge every stream in `sources`. An empty collection produces a stream
/// which ends immediately.
pub fn merge_all<I>(sources: I) -> Merge<I::Item>
where
    I: IntoIterator,
{
    sources.into_iter().collect()
}

/// The stream returned by [`Merge::into_stream`] and [`Merge::stream`].
#[must_use = "streams do nothing unless polled or .awaited"]
pub struct MergeStream<S> {
    streams: Slab<Pin<Box<S>>>,
    wakers: WakerVec,
    // Where the next poll starts looking, so a busy source can't starve the rest.
    cursor: usize,
}

impl<S> MergeStream<S> {
    pub(crate) fn new(sources: Vec<S>) -> Self {
        let wakers = WakerVec::new(sources.len());
        let mut streams = Slab::with_capacity(sources.len());
        for source in sources {
            streams.insert(Box::pin(source));
        }
        Self {
            streams,
            wakers,
            cursor: 0,
        }
    }

    /// Number of sources which have not been exhausted yet.
    pub fn active(&self) -> usize {
        self.streams.len()
    }
}

impl<S> fmt::Debug for MergeStream<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MergeStream")
            .field("active", &self.streams.len())
            .field("sources", &self.wakers.len())
            .finish_non_exhaustive()
    }
}

impl<S: Stream> Stream for MergeStream<S> {
    type Item = S::Item;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = &mut *self;

        // Short-circuit if we have no streams to iterate over
        if this.streams.is_empty() {
            return Poll::Ready(None);
        }

        let mut readiness = this.wakers.readiness();
        readiness.set_waker(cx.waker());
        if !readiness.any_ready() {
            // Nothing is ready yet
            return Poll::Pending;
        }

        let slots = this.wakers.len();
        for offset in 0..slots {
            let index = (this.cursor + offset) % slots;
            // Clear first: a leftover waker of a removed source may still fire.
            let woken = readiness.clear_ready(index);
            if !woken || !this.streams.contains(index) {
                continue;
            }

            // unlock readiness so we don't deadlock when polling
            drop(readiness);

            let (Some(stream), Some(waker)) = (this.streams.get_mut(index), this.wakers.get(index))
            else {
                readiness = this.wakers.readiness();
                continue;
            };
            let mut cx = Context::from_waker(waker);
            match stream.as_mut().poll_next(&mut cx) {
                Poll::Ready(Some(item)) => {
                    // Mark the source as ready again so the next poll asks
                    // it for another item.
                    this.wakers.readiness().set_ready(index);
                    this.cursor = (index + 1) % slots;
                    return Poll::Ready(Some(item));
                }
                Poll::Ready(None) => {
                    this.streams.remove(index);
                    tracing::trace!(
                        index,
                        remaining = this.streams.len(),
                        "merge: source exhausted"
                    );
                    if this.streams.is_empty() {
                        return Poll::Ready(None);
                    }
                }
                Poll::Pending => {}
            }

            // Lock readiness so we can use it again
            readiness = this.wakers.readiness();
        }

        Poll::Pending
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.streams
            .iter()
            .map(|(_, stream)| stream.size_hint())
            .fold((0, Some(0)), |(lower, upper), (l, u)| {
                (
                    lower.saturating_add(l),
                    upper.zip(u).and_then(|(upper, u)| upper.checked_add(u)),
                )
            })
    }
}

impl<S: Stream> FusedStream for MergeStream<S> {
    fn is_terminated(&self) -> bool {
        self.streams.is_empty()
    }
}
