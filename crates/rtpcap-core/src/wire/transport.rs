use std::net::Ipv4Addr;

use log::debug;

use super::error::WireError;
use super::layout;
use super::reader::WireReader;

/// A decoded UDP datagram with its endpoints.
#[derive(Debug)]
pub struct UdpDatagram<'a> {
    pub src_ip: Ipv4Addr,
    pub src_port: u16,
    pub dst_ip: Ipv4Addr,
    pub dst_port: u16,
    pub payload: &'a [u8],
}

/// Outcome of transport decoding: either a UDP datagram, or enough
/// information about a non-UDP packet for the caller to skip it.
#[derive(Debug)]
pub enum Transport<'a> {
    Udp(UdpDatagram<'a>),
    Other { protocol: u8, payload_len: usize },
}

/// Decode a fixed 20-byte IPv4 header and, for UDP, the 8-byte UDP header.
///
/// IPv4 options are not handled: RTP capture tooling does not emit them,
/// and the surrounding pipeline treats any resulting decode failure as a
/// skipped record. Ports are read in network byte order; older tooling
/// read them byte-swapped, so fixtures produced by it show reversed port
/// values.
pub fn parse_ipv4(packet: &[u8]) -> Result<Transport<'_>, WireError> {
    let reader = WireReader::new(packet);
    reader.require_len(layout::IPV4_HEADER_LEN)?;

    let protocol = reader.read_u8(layout::IPV4_PROTOCOL_OFFSET)?;
    if protocol != layout::PROTOCOL_UDP {
        return Ok(Transport::Other {
            protocol,
            payload_len: packet.len() - layout::IPV4_HEADER_LEN,
        });
    }

    let src_ip = reader.read_ipv4_addr(layout::IPV4_SRC_RANGE)?;
    let dst_ip = reader.read_ipv4_addr(layout::IPV4_DST_RANGE)?;

    let udp = WireReader::new(reader.slice_from(layout::IPV4_HEADER_LEN)?);
    udp.require_len(layout::UDP_HEADER_LEN)?;
    let src_port = udp.read_u16_be(layout::UDP_SRC_PORT_RANGE)?;
    let dst_port = udp.read_u16_be(layout::UDP_DST_PORT_RANGE)?;
    debug!(
        "udp {}:{} -> {}:{} (legacy byte-swapped ports would read {}:{})",
        src_ip,
        src_port,
        dst_ip,
        dst_port,
        src_port.swap_bytes(),
        dst_port.swap_bytes()
    );
    let payload = udp.slice_from(layout::UDP_HEADER_LEN)?;

    Ok(Transport::Udp(UdpDatagram {
        src_ip,
        src_port,
        dst_ip,
        dst_port,
        payload,
    }))
}
