use netrw_common::CoreId;

use crate::{
    stats::{AtomicStatSet, StatSet},
    Category, Direction,
};

/// One core's RX and TX counters, padded to a cache line so neighbouring cores
/// never share one.
#[derive(Debug, Default)]
#[repr(align(64))]
pub(crate) struct CoreSlot {
    rx: AtomicStatSet,
    tx: AtomicStatSet,
}

impl CoreSlot {
    #[inline]
    fn side(&self, direction: Direction) -> &AtomicStatSet {
        match direction {
            Direction::Rx => &self.rx,
            Direction::Tx => &self.tx,
        }
    }
}

/// Fixed array of per-core counter slots, indexed by [`CoreId`].
///
/// Writes only ever go through [`PerCoreBank::record`] and reads-with-reset only
/// through [`PerCoreBank::drain_local`]; both resolve the slot from the calling
/// thread's core, so a slot is only ever touched by the core that owns it.
#[derive(Debug)]
pub(crate) struct PerCoreBank {
    slots: Box<[CoreSlot]>,
}

impl PerCoreBank {
    pub(crate) fn new(cores: usize) -> Self {
        Self { slots: (0..cores).map(|_| CoreSlot::default()).collect() }
    }

    #[inline]
    fn local(&self) -> Option<&CoreSlot> {
        CoreId::current().and_then(|core| self.slots.get(core.index()))
    }

    /// Counts one packet on the calling core. Off-core callers count nothing.
    #[inline]
    pub(crate) fn record(&self, direction: Direction, category: Category) -> bool {
        match self.local() {
            Some(slot) => {
                slot.side(direction).increment(category);
                true
            }
            None => false,
        }
    }

    /// Reads and zeroes the calling core's (rx, tx) counters. Returns `None`
    /// when not called on a core.
    pub(crate) fn drain_local(&self) -> Option<(StatSet, StatSet)> {
        self.local().map(|slot| (slot.rx.drain(), slot.tx.drain()))
    }

    /// Reads the calling core's counters without resetting them.
    pub(crate) fn peek_local(&self) -> Option<(StatSet, StatSet)> {
        self.local().map(|slot| (slot.rx.load(), slot.tx.load()))
    }

    #[cfg(test)]
    pub(crate) fn peek(&self, core: CoreId) -> Option<(StatSet, StatSet)> {
        self.slots.get(core.index()).map(|slot| (slot.rx.load(), slot.tx.load()))
    }
}
