#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use etherparse::PacketBuilder;

/// Serialize a legacy little-endian pcap file from `(ts_sec, ts_usec,
/// frame)` records.
pub fn pcap_bytes(linktype: u32, records: &[(u32, u32, Vec<u8>)]) -> Vec<u8> {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&0xA1B2_C3D4u32.to_le_bytes());
    bytes.extend_from_slice(&2u16.to_le_bytes());
    bytes.extend_from_slice(&4u16.to_le_bytes());
    bytes.extend_from_slice(&0i32.to_le_bytes());
    bytes.extend_from_slice(&0u32.to_le_bytes());
    bytes.extend_from_slice(&65535u32.to_le_bytes());
    bytes.extend_from_slice(&linktype.to_le_bytes());

    for (ts_sec, ts_usec, frame) in records {
        bytes.extend_from_slice(&ts_sec.to_le_bytes());
        bytes.extend_from_slice(&ts_usec.to_le_bytes());
        bytes.extend_from_slice(&(frame.len() as u32).to_le_bytes());
        bytes.extend_from_slice(&(frame.len() as u32).to_le_bytes());
        bytes.extend_from_slice(frame);
    }
    bytes
}

pub fn write_pcap(dir: &Path, name: &str, linktype: u32, records: &[(u32, u32, Vec<u8>)]) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, pcap_bytes(linktype, records)).expect("write fixture");
    path
}

/// A minimal RTP datagram: fixed 12-byte header plus a small payload.
pub fn rtp_datagram(ssrc: u32, payload_type: u8, marker: bool) -> Vec<u8> {
    let mut datagram = vec![0u8; 12];
    datagram[0] = 0x80;
    datagram[1] = if marker { 0x80 | payload_type } else { payload_type };
    datagram[8..12].copy_from_slice(&ssrc.to_be_bytes());
    datagram.extend_from_slice(&[0xAB, 0xCD, 0xEF]);
    datagram
}

/// Wrap an RTP datagram in Ethernet + IPv4 + UDP.
pub fn ethernet_frame(
    src_ip: [u8; 4],
    src_port: u16,
    dst_ip: [u8; 4],
    dst_port: u16,
    rtp: &[u8],
) -> Vec<u8> {
    let builder = PacketBuilder::ethernet2([1, 2, 3, 4, 5, 6], [7, 8, 9, 10, 11, 12])
        .ipv4(src_ip, dst_ip, 64)
        .udp(src_port, dst_port);
    let mut frame = Vec::<u8>::with_capacity(builder.size(rtp.len()));
    builder.write(&mut frame, rtp).expect("build frame");
    frame
}

/// Wrap an RTP datagram with default endpoints.
pub fn default_frame(rtp: &[u8]) -> Vec<u8> {
    ethernet_frame([192, 168, 0, 1], 5004, [192, 168, 0, 2], 5006, rtp)
}

/// Wrap any payload in Ethernet + IPv4 + TCP.
pub fn tcp_frame(payload: &[u8]) -> Vec<u8> {
    let builder = PacketBuilder::ethernet2([1, 2, 3, 4, 5, 6], [7, 8, 9, 10, 11, 12])
        .ipv4([192, 168, 0, 1], [192, 168, 0, 2], 64)
        .tcp(1000, 1001, 0, 0);
    let mut frame = Vec::<u8>::with_capacity(builder.size(payload.len()));
    builder.write(&mut frame, payload).expect("build frame");
    frame
}
