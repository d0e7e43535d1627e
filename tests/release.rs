//! Every source is released exactly once, whichever way iteration ends.

use futures::channel::oneshot;
use futures_core::Stream;
use futures_lite::future::{block_on, poll_once};
use futures_lite::{stream, StreamExt};
use futures_pipelining::prelude::*;
use futures_pipelining::stream::{merge_all, Buffered, BufferedUnordered};
use futures_pipelining::Cancelled;
use std::future::{ready, Ready};
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};

/// Counts how many times each wrapped stream has been dropped.
#[derive(Clone, Default)]
struct Releases(Arc<AtomicUsize>);

impl Releases {
    fn track<S>(&self, stream: S) -> Tracked<S> {
        Tracked {
            stream,
            releases: self.clone(),
        }
    }

    fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

struct Tracked<S> {
    stream: S,
    releases: Releases,
}

impl<S> Drop for Tracked<S> {
    fn drop(&mut self) {
        self.releases.0.fetch_add(1, Ordering::SeqCst);
    }
}

impl<S: Stream + Unpin> Stream for Tracked<S> {
    type Item = S::Item;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.stream).poll_next(cx)
    }
}

fn numbers(len: i32) -> stream::Iter<std::vec::IntoIter<Ready<i32>>> {
    stream::iter((0..len).map(ready).collect::<Vec<_>>())
}

#[test]
fn buffered_releases_source_on_exhaustion() {
    block_on(async {
        let releases = Releases::default();
        let mut s = Buffered::new(releases.track(numbers(3)), 2)
            .unwrap()
            .into_stream();
        while s.next().await.is_some() {}
        assert_eq!(releases.count(), 1);
        drop(s);
        assert_eq!(releases.count(), 1);
    })
}

#[test]
fn buffered_releases_source_on_early_stop() {
    block_on(async {
        let releases = Releases::default();
        let mut s = Buffered::new(releases.track(numbers(10)), 3)
            .unwrap()
            .into_stream();
        assert_eq!(s.next().await, Some(0));
        assert_eq!(releases.count(), 0);
        drop(s);
        assert_eq!(releases.count(), 1);
    })
}

#[test]
fn buffered_unordered_releases_source_on_early_stop() {
    block_on(async {
        let releases = Releases::default();
        let mut s = BufferedUnordered::new(releases.track(numbers(10)), 3)
            .unwrap()
            .into_stream();
        assert!(s.next().await.is_some());
        drop(s);
        assert_eq!(releases.count(), 1);
    })
}

#[test]
fn buffered_drops_in_flight_futures_on_early_stop() {
    block_on(async {
        let (tx0, rx0) = oneshot::channel::<u8>();
        let (tx1, rx1) = oneshot::channel::<u8>();
        let mut s = stream::iter(vec![rx0, rx1])
            .buffered(2)
            .unwrap()
            .into_stream();
        assert!(poll_once(s.next()).await.is_none());
        drop(s);
        assert!(tx0.is_canceled());
        assert!(tx1.is_canceled());
    })
}

#[test]
fn merge_releases_each_source_once() {
    block_on(async {
        let releases = Releases::default();
        let sources: Vec<_> = (1..=4)
            .map(|len| releases.track(stream::iter(0..len)))
            .collect();
        let mut s = merge_all(sources).into_stream();

        let mut count = 0;
        while s.next().await.is_some() {
            count += 1;
        }
        assert_eq!(count, 1 + 2 + 3 + 4);
        assert_eq!(releases.count(), 4);
        drop(s);
        assert_eq!(releases.count(), 4);
    })
}

#[test]
fn merge_releases_open_sources_on_early_stop() {
    block_on(async {
        let releases = Releases::default();
        let sources: Vec<_> = (0..3)
            .map(|_| releases.track(stream::iter(0..100)))
            .collect();
        let mut s = merge_all(sources).into_stream();
        assert!(s.next().await.is_some());
        assert!(s.next().await.is_some());
        assert_eq!(releases.count(), 0);
        drop(s);
        assert_eq!(releases.count(), 3);
    })
}

#[test]
fn merge_releases_siblings_before_surfacing_a_failure() {
    block_on(async {
        let releases = Releases::default();
        let healthy = || releases.track(stream::iter(vec![Ok(1)]).chain(stream::pending()));
        let failing = releases.track(
            stream::iter(vec![Err("boom")]).chain(stream::pending::<Result<i32, &str>>()),
        );
        let mut s = healthy().try_merge([failing, healthy()]);

        let mut seen_ok = 0;
        loop {
            match s.next().await {
                Some(Ok(_)) => seen_ok += 1,
                Some(Err(err)) => {
                    assert_eq!(err, "boom");
                    assert_eq!(releases.count(), 3);
                    break;
                }
                None => panic!("merge ended without surfacing the failure"),
            }
        }
        assert!(seen_ok <= 2);
        assert_eq!(s.next().await, None);
        assert_eq!(releases.count(), 3);
    })
}

#[test]
fn try_buffered_stops_at_the_first_failure() {
    block_on(async {
        let releases = Releases::default();
        let source = releases.track(stream::iter(vec![
            ready(Ok(1)),
            ready(Err("boom")),
            ready(Ok(3)),
        ]));
        let mut s = source.try_buffered(2).unwrap();
        assert_eq!(s.next().await, Some(Ok(1)));
        assert_eq!(s.next().await, Some(Err("boom")));
        assert_eq!(releases.count(), 1);
        assert_eq!(s.next().await, None);
    })
}

#[test]
fn plain_buffered_passes_failures_through() {
    block_on(async {
        let source = stream::iter(vec![ready(Ok(1)), ready(Err("boom")), ready(Ok(3))]);
        let out: Vec<_> = source.buffered(2).unwrap().into_stream().collect().await;
        assert_eq!(out, vec![Ok(1), Err("boom"), Ok(3)]);
    })
}

#[test]
fn cancellation_releases_sources_first() {
    block_on(async {
        let releases = Releases::default();
        let (tx, rx) = oneshot::channel::<()>();
        let sources: Vec<_> = (0..3)
            .map(|_| releases.track(stream::iter(vec![1]).chain(stream::pending())))
            .collect();
        let mut s = merge_all(sources).into_stream().cancel_on(rx);

        for _ in 0..3 {
            assert_eq!(s.next().await, Some(Ok(1)));
        }
        assert!(poll_once(s.next()).await.is_none());
        assert_eq!(releases.count(), 0);

        tx.send(()).unwrap();
        assert_eq!(s.next().await, Some(Err(Cancelled)));
        assert_eq!(releases.count(), 3);
        assert_eq!(s.next().await, None);
    })
}

#[test]
fn cancellation_while_buffering() {
    block_on(async {
        let (tx, rx) = oneshot::channel::<()>();
        let (keep, pending) = oneshot::channel::<u8>();
        let mut s = stream::iter(vec![pending])
            .buffered_unordered(1)
            .unwrap()
            .into_stream()
            .cancel_on(rx);
        assert!(poll_once(s.next()).await.is_none());
        drop(tx);
        assert_eq!(s.next().await, Some(Err(Cancelled)));
        assert!(keep.is_canceled());
    })
}
