#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

mod builder;
mod packet;

pub use builder::FrameBuilder;
pub use packet::{Ipv4Header, PacketView, Ports, WireError};

pub use pnet::packet::{
    ethernet::{EtherType, EtherTypes},
    ip::{IpNextHeaderProtocol, IpNextHeaderProtocols},
};

/// Length of an Ethernet II header (no VLAN tag).
pub const ETHERNET_HEADER_LEN: usize = 14;
/// Length of an IPv4 header without options.
pub const IPV4_MIN_HEADER_LEN: usize = 20;
