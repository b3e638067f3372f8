use std::net::Ipv4Addr;

use pnet::packet::{
    ethernet::{EtherType, EtherTypes, EthernetPacket},
    ip::{IpNextHeaderProtocol, IpNextHeaderProtocols},
    ipv4::Ipv4Packet,
    tcp::TcpPacket,
    udp::UdpPacket,
    Packet,
};
use thiserror::Error;

use crate::{ETHERNET_HEADER_LEN, IPV4_MIN_HEADER_LEN};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WireError {
    #[error("Frame truncated: got {got} bytes, need at least {need}")]
    Truncated { got: usize, need: usize },
}

/// Transport-layer port pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ports {
    pub source: u16,
    pub destination: u16,
}

/// The IPv4 header fields netrw looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ipv4Header {
    pub protocol: IpNextHeaderProtocol,
    pub source: Ipv4Addr,
    pub destination: Ipv4Addr,
    /// Only set for TCP and UDP with a complete transport header.
    pub ports: Option<Ports>,
}

impl Ipv4Header {
    fn decode(bytes: &[u8]) -> Option<Self> {
        let ip = Ipv4Packet::new(bytes)?;
        if ip.get_version() != 4 {
            return None;
        }

        let header_len = usize::from(ip.get_header_length()) * 4;
        if header_len < IPV4_MIN_HEADER_LEN || header_len > bytes.len() {
            return None;
        }

        let protocol = ip.get_next_level_protocol();
        let transport = &bytes[header_len..];
        let ports = match protocol {
            IpNextHeaderProtocols::Tcp => TcpPacket::new(transport)
                .map(|tcp| Ports { source: tcp.get_source(), destination: tcp.get_destination() }),
            IpNextHeaderProtocols::Udp => UdpPacket::new(transport)
                .map(|udp| Ports { source: udp.get_source(), destination: udp.get_destination() }),
            _ => None,
        };

        Some(Self { protocol, source: ip.get_source(), destination: ip.get_destination(), ports })
    }
}

/// A read-only view over the headers of an Ethernet frame.
///
/// The view borrows the frame and never copies or modifies it. Headers are decoded
/// once on construction; an IPv4 ethertype with a truncated or malformed IP header
/// yields a view with no [`Ipv4Header`].
#[derive(Debug, Clone, Copy)]
pub struct PacketView<'a> {
    frame: &'a [u8],
    ethertype: EtherType,
    ipv4: Option<Ipv4Header>,
}

impl<'a> PacketView<'a> {
    /// Decodes the headers of `frame`. Fails only if the frame is too short to
    /// hold an Ethernet header.
    pub fn parse(frame: &'a [u8]) -> Result<Self, WireError> {
        let eth = EthernetPacket::new(frame)
            .ok_or(WireError::Truncated { got: frame.len(), need: ETHERNET_HEADER_LEN })?;

        let ethertype = eth.get_ethertype();
        let ipv4 = if ethertype == EtherTypes::Ipv4 { Ipv4Header::decode(eth.payload()) } else { None };

        Ok(Self { frame, ethertype, ipv4 })
    }

    #[inline]
    pub fn ethertype(&self) -> EtherType {
        self.ethertype
    }

    #[inline]
    pub fn ipv4(&self) -> Option<&Ipv4Header> {
        self.ipv4.as_ref()
    }

    /// The underlying frame bytes.
    #[inline]
    pub fn frame(&self) -> &'a [u8] {
        self.frame
    }
}
