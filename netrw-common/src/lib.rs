use std::{fmt, num::NonZeroUsize, thread};

mod cores;
pub use cores::{CoreError, Cores};

/// Identity of an execution core. Cores are numbered densely from zero, so a
/// [`CoreId`] doubles as an index into per-core arrays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CoreId(usize);

impl CoreId {
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0
    }

    /// Returns the core the calling thread belongs to, or `None` if the caller
    /// is not running on a [`Cores`] worker.
    #[inline]
    pub fn current() -> Option<Self> {
        cores::current()
    }
}

impl fmt::Display for CoreId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Returns the number of cores available to this process, falling back to 1.
pub fn available_cores() -> usize {
    thread::available_parallelism().map(NonZeroUsize::get).unwrap_or(1)
}
