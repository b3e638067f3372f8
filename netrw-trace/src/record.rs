use std::{fmt, net::Ipv4Addr};

use netrw_wire::{IpNextHeaderProtocol, IpNextHeaderProtocols, PacketView};

use crate::TracePoint;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    Tcp { source_port: u16, destination_port: u16 },
    Udp { source_port: u16, destination_port: u16 },
    /// Any other protocol, or TCP/UDP without a complete transport header.
    Other(IpNextHeaderProtocol),
}

/// One traced IPv4 packet. `Copy`, so it can cross into a sink without
/// allocating; rendering happens through [`Display`](fmt::Display).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlowRecord {
    pub point: TracePoint,
    pub source: Ipv4Addr,
    pub destination: Ipv4Addr,
    pub transport: Transport,
}

impl FlowRecord {
    /// Builds a record from a decoded packet. Returns `None` for anything that is
    /// not IPv4.
    pub fn from_packet(point: TracePoint, pkt: &PacketView<'_>) -> Option<Self> {
        let ip = pkt.ipv4()?;

        let transport = match (ip.protocol, ip.ports) {
            (IpNextHeaderProtocols::Tcp, Some(ports)) => {
                Transport::Tcp { source_port: ports.source, destination_port: ports.destination }
            }
            (IpNextHeaderProtocols::Udp, Some(ports)) => {
                Transport::Udp { source_port: ports.source, destination_port: ports.destination }
            }
            (protocol, _) => Transport::Other(protocol),
        };

        Some(Self { point, source: ip.source, destination: ip.destination, transport })
    }
}

impl fmt::Display for FlowRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = self.point.tag();
        match self.transport {
            Transport::Tcp { source_port, destination_port } => write!(
                f,
                "[{tag}] ({}:{source_port}) -> ({}:{destination_port}) proto (TCP)",
                self.source, self.destination
            ),
            Transport::Udp { source_port, destination_port } => write!(
                f,
                "[{tag}] ({}:{source_port}) -> ({}:{destination_port}) proto (UDP)",
                self.source, self.destination
            ),
            Transport::Other(protocol) => write!(
                f,
                "[{tag}] ({}) -> ({}) proto (0x{:x})",
                self.source, self.destination, protocol.0
            ),
        }
    }
}
