use core::future::Future;
use core::pin::Pin;
use core::task::{Context, Poll};

use futures_core::stream::{FusedStream, Stream};
use pin_project::pin_project;

use crate::Cancelled;

/// Stop a stream once a cancellation signal resolves.
///
/// The signal is checked before every poll of the inner stream. Once it
/// fires, the inner stream is dropped, releasing whatever it had opened, and
/// a single `Err(Cancelled)` is yielded before the stream ends. Items are
/// yielded as `Ok(item)` until then. The signal itself is dropped as soon as
/// the stream ends, either way.
///
/// This `struct` is created by the [`cancel_on`] method on [`StreamExt`]. See its
/// documentation for more.
///
/// [`cancel_on`]: crate::stream::StreamExt::cancel_on
/// [`StreamExt`]: crate::stream::StreamExt
#[derive(Debug)]
#[must_use = "streams do nothing unless polled or .awaited"]
#[pin_project]
pub struct CancelOn<S, C> {
    #[pin]
    stream: Option<S>,
    #[pin]
    signal: Option<C>,
}

impl<S, C> CancelOn<S, C> {
    pub(crate) fn new(stream: S, signal: C) -> Self {
        CancelOn {
            stream: Some(stream),
            signal: Some(signal),
        }
    }
}

impl<S, C> Stream for CancelOn<S, C>
where
    S: Stream,
    C: Future,
{
    type Item = Result<S::Item, Cancelled>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();
        let Some(stream) = this.stream.as_mut().as_pin_mut() else {
            return Poll::Ready(None);
        };

        let fired = match this.signal.as_mut().as_pin_mut() {
            Some(signal) => signal.poll(cx).is_ready(),
            None => false,
        };
        if fired {
            tracing::debug!("cancel_on: signal fired, releasing the stream");
            this.stream.set(None);
            this.signal.set(None);
            return Poll::Ready(Some(Err(Cancelled)));
        }

        match stream.poll_next(cx) {
            Poll::Ready(Some(item)) => Poll::Ready(Some(Ok(item))),
            Poll::Ready(None) => {
                this.stream.set(None);
                this.signal.set(None);
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl<S, C> FusedStream for CancelOn<S, C>
where
    S: Stream,
    C: Future,
{
    fn is_terminated(&self) -> bool {
        self.stream.is_none()
    }
}
