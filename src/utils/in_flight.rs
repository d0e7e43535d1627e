use core::fmt::{self, Debug};
use core::future::Future;
use core::pin::Pin;
use core::task::{Context, Poll};

use slab::Slab;

use super::WakerVec;

/// A growable set of futures raced against each other.
///
/// Each slot is polled with its own waker, so a wakeup only causes the
/// futures which were actually woken to be polled again.
pub(crate) struct InFlight<F> {
    futures: Slab<Pin<Box<F>>>,
    wakers: WakerVec,
}

impl<F> Debug for InFlight<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InFlight")
            .field("len", &self.futures.len())
            .finish_non_exhaustive()
    }
}

impl<F> InFlight<F> {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            futures: Slab::with_capacity(capacity),
            wakers: WakerVec::new(capacity),
        }
    }

    /// Number of futures which have not completed yet.
    pub(crate) fn len(&self) -> usize {
        self.futures.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.futures.is_empty()
    }
}

impl<F: Future> InFlight<F> {
    /// Insert a future which may already have been polled.
    pub(crate) fn insert(&mut self, future: Pin<Box<F>>) {
        let index = self.futures.insert(future);
        self.wakers.grow(self.futures.capacity().max(index + 1));
        self.wakers.readiness().set_ready(index);
    }

    /// Poll the woken futures, returning the output of the first one to finish.
    ///
    /// Returns `Poll::Ready(None)` if the set is empty.
    pub(crate) fn poll_next(&mut self, cx: &Context<'_>) -> Poll<Option<F::Output>> {
        if self.futures.is_empty() {
            return Poll::Ready(None);
        }

        let mut readiness = self.wakers.readiness();
        readiness.set_waker(cx.waker());
        if !readiness.any_ready() {
            return Poll::Pending;
        }

        let mut finished = None;
        for (index, future) in self.futures.iter_mut() {
            if !readiness.clear_ready(index) {
                continue;
            }

            // unlock readiness so we don't deadlock when polling
            drop(readiness);

            let Some(waker) = self.wakers.get(index) else {
                readiness = self.wakers.readiness();
                continue;
            };
            let mut cx = Context::from_waker(waker);
            if let Poll::Ready(output) = future.as_mut().poll(&mut cx) {
                finished = Some((index, output));
                break;
            }

            readiness = self.wakers.readiness();
        }

        match finished {
            Some((index, output)) => {
                self.futures.remove(index);
                Poll::Ready(Some(output))
            }
            None => Poll::Pending,
        }
    }
}
