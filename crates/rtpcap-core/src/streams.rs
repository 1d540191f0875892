use std::collections::HashMap;
use std::net::Ipv4Addr;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

use crate::decode::{RtpPacket, RtpPipeline};
use crate::source::{PacketSource, PcapFileSource, SourceError};

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("source error: {0}")]
    Source(#[from] SourceError),
}

/// Identity of one logical RTP stream: SSRC plus the endpoint tuple it was
/// observed on. Two packets belong to the same stream iff their keys are
/// equal; there is no partial matching during classification.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct StreamKey {
    pub ssrc: u32,
    pub src_ip: Ipv4Addr,
    pub src_port: u16,
    pub dst_ip: Ipv4Addr,
    pub dst_port: u16,
}

impl StreamKey {
    fn for_packet(packet: &RtpPacket) -> Self {
        Self {
            ssrc: packet.ssrc,
            src_ip: packet.src_ip,
            src_port: packet.src_port,
            dst_ip: packet.dst_ip,
            dst_port: packet.dst_port,
        }
    }
}

/// Summary of one observed stream.
///
/// `payload_types` preserves first-seen order and contains no duplicates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamSummary {
    pub ssrc: u32,
    /// Source endpoint in `ip:port` form.
    pub src: String,
    /// Destination endpoint in `ip:port` form.
    pub dst: String,
    pub packet_count: u64,
    pub payload_types: Vec<u8>,
}

/// Input capture metadata embedded in reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputInfo {
    pub path: String,
    pub bytes: u64,
}

/// Whole-capture totals for one scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureSummary {
    pub packets_total: u64,
    /// Records skipped during decoding (non-UDP, RTCP, malformed).
    pub packets_skipped: u64,
    /// RFC3339 timestamp of the first record (if any).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_start: Option<String>,
    /// RFC3339 timestamp of the last record (if any).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_end: Option<String>,
}

/// Result of enumerating the RTP streams in a capture file.
///
/// Streams appear in the order their first packet was observed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamReport {
    pub input: InputInfo,
    pub capture: CaptureSummary,
    pub streams: Vec<StreamSummary>,
}

/// Enumerate the RTP streams in a capture file.
///
/// # Examples
/// ```no_run
/// use std::path::Path;
///
/// use rtpcap_core::scan_streams;
///
/// let report = scan_streams(Path::new("media.pcap"))?;
/// for stream in &report.streams {
///     println!("{:#010x}: {} packets", stream.ssrc, stream.packet_count);
/// }
/// # Ok::<(), rtpcap_core::ScanError>(())
/// ```
pub fn scan_streams(path: &Path) -> Result<StreamReport, ScanError> {
    let source = PcapFileSource::open(path)?;
    scan_source(path, source)
}

/// Enumerate streams from an already-open packet source.
///
/// `path` is only used for report metadata.
pub fn scan_source<S: PacketSource + Send + 'static>(
    path: &Path,
    source: S,
) -> Result<StreamReport, ScanError> {
    let mut pipeline = RtpPipeline::new(Box::new(source));

    let mut index: HashMap<StreamKey, usize> = HashMap::new();
    let mut records: Vec<(StreamKey, u64, Vec<u8>)> = Vec::new();

    while let Some(packet) = pipeline.next_rtp()? {
        let key = StreamKey::for_packet(&packet);
        match index.get(&key) {
            Some(&position) => {
                let (_, count, payload_types) = &mut records[position];
                *count += 1;
                if !payload_types.contains(&packet.payload_type) {
                    payload_types.push(packet.payload_type);
                }
            }
            None => {
                index.insert(key.clone(), records.len());
                records.push((key, 1, vec![packet.payload_type]));
            }
        }
    }

    let (first_ts, last_ts) = pipeline.ts_bounds();
    let capture = CaptureSummary {
        packets_total: pipeline.packets_total(),
        packets_skipped: pipeline.skipped().total(),
        time_start: ts_to_rfc3339(first_ts),
        time_end: ts_to_rfc3339(last_ts),
    };

    let streams = records
        .into_iter()
        .map(|(key, packet_count, payload_types)| StreamSummary {
            ssrc: key.ssrc,
            src: format_endpoint(key.src_ip, key.src_port),
            dst: format_endpoint(key.dst_ip, key.dst_port),
            packet_count,
            payload_types,
        })
        .collect();

    Ok(StreamReport {
        input: InputInfo {
            path: path.display().to_string(),
            bytes: path.metadata().map(|meta| meta.len()).unwrap_or(0),
        },
        capture,
        streams,
    })
}

fn format_endpoint(ip: Ipv4Addr, port: u16) -> String {
    format!("{ip}:{port}")
}

fn ts_to_rfc3339(ts_nanos: Option<i64>) -> Option<String> {
    let ts_nanos = ts_nanos?;
    OffsetDateTime::from_unix_timestamp_nanos(ts_nanos as i128)
        .ok()
        .and_then(|dt| dt.format(&Rfc3339).ok())
}
