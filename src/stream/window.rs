use core::fmt;
use core::num::NonZeroUsize;

use crate::Error;

/// The number of items a buffered stream may hold un-consumed at once.
///
/// # Examples
///
/// ```
/// use futures_pipelining::stream::WindowSize;
/// use futures_pipelining::Error;
///
/// assert_eq!(WindowSize::new(4).unwrap().get(), 4);
/// assert_eq!(WindowSize::new(0), Err(Error::ZeroWindow));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WindowSize(NonZeroUsize);

impl WindowSize {
    /// Validate a window size. Zero is rejected.
    pub fn new(size: usize) -> Result<Self, Error> {
        NonZeroUsize::new(size).map(Self).ok_or(Error::ZeroWindow)
    }

    /// Returns the window size as a `usize`.
    pub fn get(self) -> usize {
        self.0.get()
    }
}

impl From<NonZeroUsize> for WindowSize {
    fn from(size: NonZeroUsize) -> Self {
        Self(size)
    }
}

impl TryFrom<usize> for WindowSize {
    type Error = Error;

    fn try_from(size: usize) -> Result<Self, Self::Error> {
        Self::new(size)
    }
}

impl fmt::Display for WindowSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}
