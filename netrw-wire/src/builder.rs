use std::net::Ipv4Addr;

use bytes::Bytes;
use pnet::{
    packet::{
        arp::{ArpHardwareTypes, ArpOperations, MutableArpPacket},
        ethernet::{EtherType, EtherTypes, MutableEthernetPacket},
        ip::{IpNextHeaderProtocol, IpNextHeaderProtocols},
        ipv4::{self, MutableIpv4Packet},
        tcp::MutableTcpPacket,
        udp::MutableUdpPacket,
    },
    util::MacAddr,
};

use crate::{ETHERNET_HEADER_LEN, IPV4_MIN_HEADER_LEN};

const ARP_PACKET_LEN: usize = 28;
const TCP_MIN_HEADER_LEN: usize = 20;
const UDP_HEADER_LEN: usize = 8;

#[derive(Debug, Clone, Copy)]
enum Payload {
    Empty,
    Arp { sender: Ipv4Addr, target: Ipv4Addr },
    Ipv4 { source: Ipv4Addr, destination: Ipv4Addr, protocol: IpNextHeaderProtocol, ports: (u16, u16) },
}

/// Builds well-formed Ethernet frames: ARP requests, IPv4 over TCP/UDP/anything,
/// or a bare header with an arbitrary ethertype.
#[derive(Debug, Clone)]
pub struct FrameBuilder {
    source_mac: MacAddr,
    destination_mac: MacAddr,
    ethertype: EtherType,
    payload: Payload,
}

impl FrameBuilder {
    /// A frame with the given ethertype and no payload.
    pub fn ethertype(ethertype: EtherType) -> Self {
        Self {
            source_mac: MacAddr::new(0x02, 0, 0, 0, 0, 0x01),
            destination_mac: MacAddr::broadcast(),
            ethertype,
            payload: Payload::Empty,
        }
    }

    /// An ARP request asking for 10.0.0.2 on behalf of 10.0.0.1.
    pub fn arp() -> Self {
        Self {
            payload: Payload::Arp {
                sender: Ipv4Addr::new(10, 0, 0, 1),
                target: Ipv4Addr::new(10, 0, 0, 2),
            },
            ..Self::ethertype(EtherTypes::Arp)
        }
    }

    /// An IPv4 packet with no transport header. Use [`tcp`](Self::tcp),
    /// [`udp`](Self::udp) or [`protocol`](Self::protocol) to pick one.
    pub fn ipv4(source: Ipv4Addr, destination: Ipv4Addr) -> Self {
        Self {
            destination_mac: MacAddr::new(0x02, 0, 0, 0, 0, 0x02),
            payload: Payload::Ipv4 {
                source,
                destination,
                protocol: IpNextHeaderProtocols::Icmp,
                ports: (0, 0),
            },
            ..Self::ethertype(EtherTypes::Ipv4)
        }
    }

    pub fn tcp(self, source_port: u16, destination_port: u16) -> Self {
        self.transport(IpNextHeaderProtocols::Tcp, (source_port, destination_port))
    }

    pub fn udp(self, source_port: u16, destination_port: u16) -> Self {
        self.transport(IpNextHeaderProtocols::Udp, (source_port, destination_port))
    }

    /// Sets the IP protocol number. Only meaningful for IPv4 frames.
    pub fn protocol(self, protocol: IpNextHeaderProtocol) -> Self {
        self.transport(protocol, (0, 0))
    }

    pub fn source_mac(mut self, mac: MacAddr) -> Self {
        self.source_mac = mac;
        self
    }

    pub fn destination_mac(mut self, mac: MacAddr) -> Self {
        self.destination_mac = mac;
        self
    }

    fn transport(mut self, protocol: IpNextHeaderProtocol, ports: (u16, u16)) -> Self {
        if let Payload::Ipv4 { protocol: p, ports: pp, .. } = &mut self.payload {
            *p = protocol;
            *pp = ports;
        }
        self
    }

    fn payload_len(&self) -> usize {
        match self.payload {
            Payload::Empty => 0,
            Payload::Arp { .. } => ARP_PACKET_LEN,
            Payload::Ipv4 { protocol, .. } => {
                IPV4_MIN_HEADER_LEN +
                    match protocol {
                        IpNextHeaderProtocols::Tcp => TCP_MIN_HEADER_LEN,
                        IpNextHeaderProtocols::Udp => UDP_HEADER_LEN,
                        _ => 0,
                    }
            }
        }
    }

    pub fn build(&self) -> Bytes {
        let mut buf = vec![0u8; ETHERNET_HEADER_LEN + self.payload_len()];

        let mut eth = MutableEthernetPacket::new(&mut buf).expect("buffer holds an ethernet header");
        eth.set_source(self.source_mac);
        eth.set_destination(self.destination_mac);
        eth.set_ethertype(self.ethertype);

        match self.payload {
            Payload::Empty => {}
            Payload::Arp { sender, target } => {
                let mut arp =
                    MutableArpPacket::new(&mut buf[ETHERNET_HEADER_LEN..]).expect("buffer sized for arp");
                arp.set_hardware_type(ArpHardwareTypes::Ethernet);
                arp.set_protocol_type(EtherTypes::Ipv4);
                arp.set_hw_addr_len(6);
                arp.set_proto_addr_len(4);
                arp.set_operation(ArpOperations::Request);
                arp.set_sender_hw_addr(self.source_mac);
                arp.set_sender_proto_addr(sender);
                arp.set_target_hw_addr(MacAddr::zero());
                arp.set_target_proto_addr(target);
            }
            Payload::Ipv4 { source, destination, protocol, ports } => {
                let ip_len = self.payload_len();
                let (ip_header, transport) =
                    buf[ETHERNET_HEADER_LEN..].split_at_mut(IPV4_MIN_HEADER_LEN);

                match protocol {
                    IpNextHeaderProtocols::Tcp => {
                        let mut tcp = MutableTcpPacket::new(transport).expect("buffer sized for tcp");
                        tcp.set_source(ports.0);
                        tcp.set_destination(ports.1);
                        tcp.set_data_offset(5);
                    }
                    IpNextHeaderProtocols::Udp => {
                        let mut udp = MutableUdpPacket::new(transport).expect("buffer sized for udp");
                        udp.set_source(ports.0);
                        udp.set_destination(ports.1);
                        udp.set_length(UDP_HEADER_LEN as u16);
                    }
                    _ => {}
                }

                let mut ip = MutableIpv4Packet::new(ip_header).expect("buffer sized for ipv4");
                ip.set_version(4);
                ip.set_header_length(5);
                ip.set_total_length(ip_len as u16);
                ip.set_ttl(64);
                ip.set_next_level_protocol(protocol);
                ip.set_source(source);
                ip.set_destination(destination);
                let checksum = ipv4::checksum(&ip.to_immutable());
                ip.set_checksum(checksum);
            }
        }

        Bytes::from(buf)
    }
}
