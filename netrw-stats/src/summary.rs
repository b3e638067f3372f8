use parking_lot::Mutex;

use crate::StatSet;

/// A point-in-time copy of the global RX and TX totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub rx: StatSet,
    pub tx: StatSet,
}

impl Summary {
    pub fn total(&self) -> u64 {
        self.rx.total().saturating_add(self.tx.total())
    }
}

/// The totals every collection pass folds into. RX and TX have independent
/// locks and no code path holds both at once.
#[derive(Debug, Default)]
pub(crate) struct GlobalSummary {
    rx: Mutex<StatSet>,
    tx: Mutex<StatSet>,
}

impl GlobalSummary {
    pub(crate) fn fold_rx(&self, drained: &StatSet) {
        self.rx.lock().fold(drained);
    }

    pub(crate) fn fold_tx(&self, drained: &StatSet) {
        self.tx.lock().fold(drained);
    }

    /// Copies each half under its own lock. The two halves are not taken
    /// atomically with respect to each other.
    pub(crate) fn snapshot(&self) -> Summary {
        let rx = *self.rx.lock();
        let tx = *self.tx.lock();
        Summary { rx, tx }
    }
}
