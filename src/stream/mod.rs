//! Bounded concurrency and fan-in for asynchronous iteration.
//!
//! # Examples
//!
//! Pipeline a stream of futures, keeping at most three in flight while still
//! handing out results in their original order:
//!
//! ```
//! use futures_pipelining::prelude::*;
//! use futures_lite::future::block_on;
//! use futures_lite::{stream, StreamExt};
//!
//! fn main() {
//!     block_on(async {
//!         let lookups = stream::iter(1..=5).map(|n| async move { n * 10 });
//!         let out: Vec<_> = lookups.buffered(3).unwrap().into_stream().collect().await;
//!         assert_eq!(out, vec![10, 20, 30, 40, 50]);
//!     })
//! }
//! ```
//!
//! # Concurrency
//!
//! Each operation describes the work first and only starts once turned into a
//! stream with `into_stream` (or `stream`, for cloneable sources). Every
//! iteration owns its own window, so the same description can be iterated
//! more than once, concurrently if need be.
//!
//! | Name                | Input                  | When is a value yielded? |
//! | ---                 | ---                    | ---                      |
//! | `Buffered`          | stream of futures      | When it and every earlier future have finished
//! | `BufferedUnordered` | stream of futures      | As soon as its future finishes
//! | `Merge`             | several streams        | As soon as any source produces it
//!
//! ## Failures and cancellation
//!
//! A future or stream which produces `Result`s never has its errors swallowed:
//! an `Err` is yielded in the position its value would have been. To treat the
//! first error as the end of the whole operation use
//! [`short_circuit`](StreamExt::short_circuit) or one of the `try_` methods.
//! To stop early from the outside use [`cancel_on`](StreamExt::cancel_on).
//! In every case the sources are dropped before the outcome is observed.
pub use buffered::{Buffered, BufferedStream};
pub use buffered_unordered::{BufferedUnordered, BufferedUnorderedStream};
pub use cancel_on::CancelOn;
pub use merge::{merge, merge_all, Merge, MergeStream};
pub use short_circuit::ShortCircuit;
pub use stream_ext::StreamExt;
pub use window::WindowSize;

mod buffered;
mod buffered_unordered;
mod cancel_on;
mod merge;
mod short_circuit;
mod stream_ext;
mod window;
