use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use crate::Category;

/// Traffic counters for one direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatSet {
    pub l2_arp: u32,
    pub l3_unicast: u64,
    pub l3_broadcast: u64,
    pub l3_multicast: u64,
}

impl StatSet {
    /// Adds `other` into `self`, saturating each field.
    pub fn fold(&mut self, other: &StatSet) {
        self.l2_arp = self.l2_arp.saturating_add(other.l2_arp);
        self.l3_unicast = self.l3_unicast.saturating_add(other.l3_unicast);
        self.l3_broadcast = self.l3_broadcast.saturating_add(other.l3_broadcast);
        self.l3_multicast = self.l3_multicast.saturating_add(other.l3_multicast);
    }

    /// Sum of every counter.
    pub fn total(&self) -> u64 {
        u64::from(self.l2_arp)
            .saturating_add(self.l3_unicast)
            .saturating_add(self.l3_broadcast)
            .saturating_add(self.l3_multicast)
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::default()
    }

    /// Returns the counter for `category`, or `None` for [`Category::Ignored`].
    pub fn get(&self, category: Category) -> Option<u64> {
        match category {
            Category::Arp => Some(u64::from(self.l2_arp)),
            Category::Unicast => Some(self.l3_unicast),
            Category::Broadcast => Some(self.l3_broadcast),
            Category::Multicast => Some(self.l3_multicast),
            Category::Ignored => None,
        }
    }
}

/// Per-core storage for one [`StatSet`].
///
/// Only the owning core increments it, and the drain runs on the owning core too,
/// so every access is uncontended. Increments wrap on overflow.
#[derive(Debug, Default)]
pub(crate) struct AtomicStatSet {
    l2_arp: AtomicU32,
    l3_unicast: AtomicU64,
    l3_broadcast: AtomicU64,
    l3_multicast: AtomicU64,
}

impl AtomicStatSet {
    #[inline]
    pub(crate) fn increment(&self, category: Category) {
        match category {
            Category::Arp => {
                self.l2_arp.fetch_add(1, Ordering::Relaxed);
            }
            Category::Unicast => {
                self.l3_unicast.fetch_add(1, Ordering::Relaxed);
            }
            Category::Broadcast => {
                self.l3_broadcast.fetch_add(1, Ordering::Relaxed);
            }
            Category::Multicast => {
                self.l3_multicast.fetch_add(1, Ordering::Relaxed);
            }
            Category::Ignored => {}
        }
    }

    /// Reads every counter and resets it to zero.
    pub(crate) fn drain(&self) -> StatSet {
        StatSet {
            l2_arp: self.l2_arp.swap(0, Ordering::Relaxed),
            l3_unicast: self.l3_unicast.swap(0, Ordering::Relaxed),
            l3_broadcast: self.l3_broadcast.swap(0, Ordering::Relaxed),
            l3_multicast: self.l3_multicast.swap(0, Ordering::Relaxed),
        }
    }

    pub(crate) fn load(&self) -> StatSet {
        StatSet {
            l2_arp: self.l2_arp.load(Ordering::Relaxed),
            l3_unicast: self.l3_unicast.load(Ordering::Relaxed),
            l3_broadcast: self.l3_broadcast.load(Ordering::Relaxed),
            l3_multicast: self.l3_multicast.load(Ordering::Relaxed),
        }
    }
}
