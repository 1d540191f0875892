use std::net::Ipv4Addr;

use log::debug;

use crate::rtp;
use crate::source::{CapturedPacket, PacketSource, SourceError};
use crate::wire;

/// A fully decoded RTP packet recovered from a capture file.
///
/// `data` is the complete RTP datagram (header included), exactly as it
/// would have arrived on the wire. Built fresh per record and owned by the
/// caller that pulled it.
#[derive(Debug, Clone)]
pub struct RtpPacket {
    pub timestamp_nanos: i64,
    pub ssrc: u32,
    pub payload_type: u8,
    pub marker: bool,
    pub protocol: u8,
    pub src_ip: Ipv4Addr,
    pub src_port: u16,
    pub dst_ip: Ipv4Addr,
    pub dst_port: u16,
    pub data: Vec<u8>,
}

impl RtpPacket {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Why a captured frame was dropped instead of decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SkipReason {
    Link,
    NotUdp(u8),
    Rtcp,
    MalformedRtp,
}

/// Running totals of records that did not survive decoding.
#[derive(Debug, Default, Clone, Copy)]
pub struct SkipCounters {
    pub link: u64,
    pub not_udp: u64,
    pub rtcp: u64,
    pub malformed_rtp: u64,
}

impl SkipCounters {
    pub fn total(&self) -> u64 {
        self.link + self.not_udp + self.rtcp + self.malformed_rtp
    }

    fn record(&mut self, reason: SkipReason) {
        match reason {
            SkipReason::Link => self.link += 1,
            SkipReason::NotUdp(_) => self.not_udp += 1,
            SkipReason::Rtcp => self.rtcp += 1,
            SkipReason::MalformedRtp => self.malformed_rtp += 1,
        }
    }
}

/// Pulls captured frames from a source and decodes them into RTP packets,
/// silently skipping anything that is not a well-formed RTP-over-UDP
/// frame. Shared by stream enumeration and timed replay so the two agree
/// on what counts as an RTP packet.
pub(crate) struct RtpPipeline {
    source: Box<dyn PacketSource + Send>,
    skipped: SkipCounters,
    packets_total: u64,
    first_ts: Option<i64>,
    last_ts: Option<i64>,
}

impl RtpPipeline {
    pub(crate) fn new(source: Box<dyn PacketSource + Send>) -> Self {
        Self {
            source,
            skipped: SkipCounters::default(),
            packets_total: 0,
            first_ts: None,
            last_ts: None,
        }
    }

    /// Next decodable RTP packet, or `Ok(None)` at end of capture.
    pub(crate) fn next_rtp(&mut self) -> Result<Option<RtpPacket>, SourceError> {
        while let Some(captured) = self.source.next_packet()? {
            self.packets_total += 1;
            self.update_ts_bounds(captured.timestamp_nanos);
            match decode_frame(&captured) {
                Ok(packet) => return Ok(Some(packet)),
                Err(reason) => {
                    self.skipped.record(reason);
                    match reason {
                        SkipReason::NotUdp(protocol) => {
                            debug!("skipping non-UDP packet (protocol {protocol})");
                        }
                        reason => debug!("skipping record: {reason:?}"),
                    }
                }
            }
        }
        Ok(None)
    }

    pub(crate) fn packets_total(&self) -> u64 {
        self.packets_total
    }

    pub(crate) fn skipped(&self) -> SkipCounters {
        self.skipped
    }

    pub(crate) fn ts_bounds(&self) -> (Option<i64>, Option<i64>) {
        (self.first_ts, self.last_ts)
    }

    fn update_ts_bounds(&mut self, ts: i64) {
        match self.first_ts {
            None => self.first_ts = Some(ts),
            Some(existing) if ts < existing => self.first_ts = Some(ts),
            Some(_) => {}
        }
        match self.last_ts {
            None => self.last_ts = Some(ts),
            Some(existing) if ts > existing => self.last_ts = Some(ts),
            Some(_) => {}
        }
    }
}

fn decode_frame(captured: &CapturedPacket) -> Result<RtpPacket, SkipReason> {
    let ip_packet =
        wire::strip_link_header(captured.linktype, &captured.data).map_err(|_| SkipReason::Link)?;

    let udp = match wire::parse_ipv4(ip_packet) {
        Ok(wire::Transport::Udp(udp)) => udp,
        Ok(wire::Transport::Other { protocol, .. }) => return Err(SkipReason::NotUdp(protocol)),
        Err(_) => return Err(SkipReason::Link),
    };

    let header = rtp::parse_rtp_header(udp.payload).map_err(|_| SkipReason::MalformedRtp)?;
    if rtp::is_rtcp_payload_type(header.payload_type) {
        return Err(SkipReason::Rtcp);
    }

    Ok(RtpPacket {
        timestamp_nanos: captured.timestamp_nanos,
        ssrc: header.ssrc,
        payload_type: header.payload_type,
        marker: header.marker,
        protocol: wire::layout::PROTOCOL_UDP,
        src_ip: udp.src_ip,
        src_port: udp.src_port,
        dst_ip: udp.dst_ip,
        dst_port: udp.dst_port,
        data: udp.payload.to_vec(),
    })
}
