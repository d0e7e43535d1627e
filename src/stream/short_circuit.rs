use core::pin::Pin;
use core::task::{Context, Poll};

use futures_core::stream::{FusedStream, Stream};
use pin_project::pin_project;

/// End a stream of `Result`s at the first `Err`.
///
/// When the inner stream yields an error, the inner stream is dropped
/// *before* the error is handed out. For the combinators in this crate that
/// means every source, every in-flight future and every merged stream has
/// been released by the time the caller observes the failure. The stream
/// ends after the error.
///
/// This `struct` is created by the [`short_circuit`] method on [`StreamExt`].
/// See its documentation for more.
///
/// [`short_circuit`]: crate::stream::StreamExt::short_circuit
/// [`StreamExt`]: crate::stream::StreamExt
#[derive(Debug)]
#[must_use = "streams do nothing unless polled or .awaited"]
#[pin_project]
pub struct ShortCircuit<S> {
    #[pin]
    stream: Option<S>,
}

impl<S> ShortCircuit<S> {
    pub(crate) fn new(stream: S) -> Self {
        Self {
            stream: Some(stream),
        }
    }
}

impl<S, T, E> Stream for ShortCircuit<S>
where
    S: Stream<Item = Result<T, E>>,
{
    type Item = Result<T, E>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();
        let Some(stream) = this.stream.as_mut().as_pin_mut() else {
            return Poll::Ready(None);
        };

        match stream.poll_next(cx) {
            Poll::Ready(Some(Ok(item))) => Poll::Ready(Some(Ok(item))),
            Poll::Ready(Some(Err(err))) => {
                tracing::debug!("short_circuit: stopping at the first error");
                this.stream.set(None);
                Poll::Ready(Some(Err(err)))
            }
            Poll::Ready(None) => {
                this.stream.set(None);
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match &self.stream {
            Some(stream) => (0, stream.size_hint().1),
            None => (0, Some(0)),
        }
    }
}

impl<S, T, E> FusedStream for ShortCircuit<S>
where
    S: Stream<Item = Result<T, E>>,
{
    fn is_terminated(&self) -> bool {
        self.stream.is_none()
    }
}
