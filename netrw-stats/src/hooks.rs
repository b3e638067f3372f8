use std::{fmt, sync::Arc};

use netrw_wire::PacketView;

use crate::{Category, Shared};

/// Which side of the interface a packet was seen on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Rx,
    Tx,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rx => f.write_str("RX"),
            Self::Tx => f.write_str("TX"),
        }
    }
}

/// Packet-path entry points. Cheap to clone; hand one to every place that sees
/// frames.
///
/// The hooks never lock, allocate or block, and they never fail: a disabled gate,
/// an ignored frame or a call from a thread that is not a core all end in a
/// silent no-op.
#[derive(Clone)]
pub struct Hooks {
    pub(crate) shared: Arc<Shared>,
}

impl Hooks {
    /// Called for every received frame.
    #[inline]
    pub fn on_rx(&self, pkt: &PacketView<'_>) {
        self.on_packet(Direction::Rx, pkt)
    }

    /// Called for every transmitted frame.
    #[inline]
    pub fn on_tx(&self, pkt: &PacketView<'_>) {
        self.on_packet(Direction::Tx, pkt)
    }

    #[inline]
    pub fn on_packet(&self, direction: Direction, pkt: &PacketView<'_>) {
        if !self.shared.gate.read() {
            return;
        }

        let category = Category::of(pkt);
        if category == Category::Ignored {
            return;
        }

        self.shared.bank.record(direction, category);
    }
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks").field("enabled", &self.shared.gate.read()).finish()
    }
}
