use std::net::Ipv4Addr;

use netrw_wire::{EtherType, EtherTypes, PacketView};

/// The traffic class a frame is counted under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Arp,
    Unicast,
    Broadcast,
    Multicast,
    Ignored,
}

impl Category {
    /// Classifies a decoded frame. An IPv4 frame whose IP header could not be
    /// decoded is [`Category::Ignored`].
    #[inline]
    pub fn of(pkt: &PacketView<'_>) -> Self {
        classify(pkt.ethertype(), pkt.ipv4().map(|ip| ip.destination))
    }
}

/// Classifies a frame by its ethertype and, for IPv4, its destination address.
///
/// The limited broadcast address is checked before the multicast range, and
/// anything at or above 224.0.0.0 that is not a broadcast counts as multicast.
#[inline]
pub fn classify(ethertype: EtherType, destination: Option<Ipv4Addr>) -> Category {
    match ethertype {
        EtherTypes::Arp => Category::Arp,
        EtherTypes::Ipv4 => match destination {
            Some(addr) if addr == Ipv4Addr::BROADCAST => Category::Broadcast,
            Some(addr) if u32::from(addr) & 0xe000_0000 == 0xe000_0000 => Category::Multicast,
            Some(_) => Category::Unicast,
            None => Category::Ignored,
        },
        _ => Category::Ignored,
    }
}
