use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

/// The global on/off switch for classification and collection.
///
/// Reads are a single atomic load and never block. Writes are serialized by a
/// writer lock that readers never take.
#[derive(Debug, Default)]
pub struct EnableGate {
    enabled: AtomicBool,
    writer: Mutex<()>,
}

impl EnableGate {
    /// A gate that starts disabled.
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn read(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    /// Sets the gate and returns the previous value. Writing the current value
    /// leaves the gate untouched.
    pub fn write(&self, enabled: bool) -> bool {
        let _guard = self.writer.lock();

        let previous = self.enabled.load(Ordering::Relaxed);
        if previous == enabled {
            return previous;
        }

        self.enabled.store(enabled, Ordering::Release);
        previous
    }
}
