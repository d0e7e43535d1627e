use crate::stream::{
    Buffered, BufferedStream, BufferedUnordered, BufferedUnorderedStream, CancelOn, Merge,
    MergeStream, ShortCircuit,
};
use crate::Error;

use core::future::{Future, IntoFuture};
use futures_core::Stream;

/// An extension trait for the `Stream` trait.
pub trait StreamExt: Stream {
    /// Run up to `window` of this stream's futures concurrently, yielding
    /// their outputs in the order they were pulled.
    ///
    /// Fails with [`Error::ZeroWindow`] if `window` is zero.
    fn buffered(self, window: usize) -> Result<Buffered<Self>, Error>
    where
        Self: Sized,
        Self::Item: Future;

    /// Run up to `window` of this stream's futures concurrently, yielding
    /// their outputs as soon as they finish.
    ///
    /// Fails with [`Error::ZeroWindow`] if `window` is zero.
    fn buffered_unordered(self, window: usize) -> Result<BufferedUnordered<Self>, Error>
    where
        Self: Sized,
        Self::Item: Future;

    /// Like [`buffered`], but the first `Err` output ends the stream after
    /// every remaining future and the source have been dropped.
    ///
    /// [`buffered`]: StreamExt::buffered
    fn try_buffered<T, E>(
        self,
        window: usize,
    ) -> Result<ShortCircuit<BufferedStream<Self>>, Error>
    where
        Self: Sized,
        Self::Item: Future<Output = Result<T, E>>;

    /// Like [`buffered_unordered`], but the first `Err` output ends the stream
    /// after every remaining future and the source have been dropped.
    ///
    /// [`buffered_unordered`]: StreamExt::buffered_unordered
    fn try_buffered_unordered<T, E>(
        self,
        window: usize,
    ) -> Result<ShortCircuit<BufferedUnorderedStream<Self>>, Error>
    where
        Self: Sized,
        Self::Item: Future<Output = Result<T, E>>;

    /// Combine this stream with `others` into a single stream of all their
    /// outputs.
    fn merge<I>(self, others: I) -> Merge<Self>
    where
        Self: Sized,
        I: IntoIterator<Item = Self>;

    /// Like [`merge`], but the first `Err` from any source ends the stream
    /// after every other source has been dropped.
    ///
    /// [`merge`]: StreamExt::merge
    fn try_merge<T, E, I>(self, others: I) -> ShortCircuit<MergeStream<Self>>
    where
        Self: Stream<Item = Result<T, E>> + Sized,
        I: IntoIterator<Item = Self>;

    /// End the stream at its first `Err`, dropping the stream before the
    /// error is yielded.
    fn short_circuit<T, E>(self) -> ShortCircuit<Self>
    where
        Self: Stream<Item = Result<T, E>> + Sized;

    /// Stop the stream as soon as `signal` resolves.
    ///
    /// The signal is checked every time the stream is polled. When it fires,
    /// the stream is dropped and `Err(Cancelled)` is yielded once.
    ///
    /// # Example
    ///
    /// ```
    /// use futures_pipelining::prelude::*;
    /// use futures_pipelining::Cancelled;
    /// use futures_lite::future::block_on;
    /// use futures_lite::{stream, StreamExt as _};
    ///
    /// block_on(async {
    ///     let mut s = stream::pending::<u8>().cancel_on(std::future::ready(()));
    ///     assert_eq!(s.next().await, Some(Err(Cancelled)));
    ///     assert_eq!(s.next().await, None);
    /// })
    /// ```
    fn cancel_on<C>(self, signal: C) -> CancelOn<Self, C::IntoFuture>
    where
        Self: Sized,
        C: IntoFuture;
}

impl<S1> StreamExt for S1
where
    S1: Stream,
{
    fn buffered(self, window: usize) -> Result<Buffered<Self>, Error>
    where
        Self::Item: Future,
    {
        Buffered::new(self, window)
    }

    fn buffered_unordered(self, window: usize) -> Result<BufferedUnordered<Self>, Error>
    where
        Self::Item: Future,
    {
        BufferedUnordered::new(self, window)
    }

    fn try_buffered<T, E>(self, window: usize) -> Result<ShortCircuit<BufferedStream<Self>>, Error>
    where
        Self::Item: Future<Output = Result<T, E>>,
    {
        Ok(ShortCircuit::new(Buffered::new(self, window)?.into_stream()))
    }

    fn try_buffered_unordered<T, E>(
        self,
        window: usize,
    ) -> Result<ShortCircuit<BufferedUnorderedStream<Self>>, Error>
    where
        Self::Item: Future<Output = Result<T, E>>,
    {
        Ok(ShortCircuit::new(
            BufferedUnordered::new(self, window)?.into_stream(),
        ))
    }

    fn merge<I>(self, others: I) -> Merge<Self>
    where
        I: IntoIterator<Item = Self>,
    {
        crate::stream::merge(self, others)
    }

    fn try_merge<T, E, I>(self, others: I) -> ShortCircuit<MergeStream<Self>>
    where
        Self: Stream<Item = Result<T, E>>,
        I: IntoIterator<Item = Self>,
    {
        ShortCircuit::new(crate::stream::merge(self, others).into_stream())
    }

    fn short_circuit<T, E>(self) -> ShortCircuit<Self>
    where
        Self: Stream<Item = Result<T, E>>,
    {
        ShortCircuit::new(self)
    }

    fn cancel_on<C>(self, signal: C) -> CancelOn<Self, C::IntoFuture>
    where
        C: IntoFuture,
    {
        CancelOn::new(self, signal.into_future())
    }
}
