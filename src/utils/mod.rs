//! Polling plumbing shared by the windowed combinators and `Merge`.

mod in_flight;
mod wakers;

pub(crate) use in_flight::InFlight;
pub(crate) use wakers::WakerVec;
