//! Controlled concurrency for [`Stream`][futures_core::Stream] pipelines.
//!
//! Processing a stream of futures one at a time leaves concurrency on the
//! table, while spawning all of them at once gives up any bound on the work in
//! flight. This crate sits in between:
//!
//! - [`stream::Buffered`]: keep up to `N` futures in flight, yield outputs in
//!   their original order.
//! - [`stream::BufferedUnordered`]: keep up to `N` futures in flight, yield
//!   whichever finishes first.
//! - [`stream::Merge`]: drain several independent streams concurrently into one.
//!
//! The combinators never spawn tasks. They poll the futures and streams they
//! are given, on whatever executor polls them.
//!
//! # Examples
//!
//! ```rust
//! use futures_pipelining::prelude::*;
//! use futures_lite::future::block_on;
//! use futures_lite::{stream, StreamExt};
//! use std::future;
//!
//! block_on(async {
//!     let work = stream::iter(vec![future::ready(1), future::ready(2), future::ready(3)]);
//!     let mut out: Vec<_> = work.buffered_unordered(2).unwrap().into_stream().collect().await;
//!     out.sort_unstable();
//!     assert_eq!(out, vec![1, 2, 3]);
//! })
//! ```

#![deny(missing_debug_implementations, nonstandard_style)]
#![warn(missing_docs, unreachable_pub)]

mod error;
mod utils;

/// The futures pipelining prelude.
pub mod prelude {
    pub use super::stream::StreamExt as _;
}

pub mod stream;

pub use error::{Cancelled, Error};
