//! Core engine for replaying RTP streams out of pcap capture files.
//!
//! The pipeline is strictly layered: a capture source yields raw frames
//! with timestamps, the wire layer strips link/IP/UDP envelopes, and the
//! RTP view recovers stream identity. Both consumers (stream enumeration
//! and timed replay) share that decode path so they always agree on what
//! counts as an RTP packet. All I/O lives in `source`; parsing is
//! byte-oriented and side-effect free.
//!
//! Invariants:
//! - A capture session is single-pass; there is no rewind.
//! - Malformed records are skipped and counted, never surfaced as errors.
//! - Replay pacing is corrected against one fixed offset taken from the
//!   first delivered packet, so per-packet error does not accumulate.
//!
//! # Examples
//! ```no_run
//! use std::path::Path;
//!
//! use rtpcap_core::{ReplayConfig, ReplaySession, RtpReceiver, scan_streams};
//!
//! let report = scan_streams(Path::new("media.pcap"))?;
//! let stream = report.streams.first().expect("no RTP streams in capture");
//! println!("replaying {:#010x}", stream.ssrc);
//!
//! let config = ReplayConfig {
//!     filter: rtpcap_core::StreamFilter::for_ssrc(stream.ssrc),
//!     ..ReplayConfig::default()
//! };
//! let mut session = ReplaySession::open(Path::new("media.pcap"), config)?;
//! while let Some(packet) = session.receive()? {
//!     // hand the datagram to the media stack
//!     let _ = packet.data;
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod decode;
mod replay;
mod rtp;
mod source;
mod streams;
mod wire;

pub use decode::{RtpPacket, SkipCounters};
pub use replay::{
    Clock, LossError, LossProfile, PacketLossModel, PlaybackClock, ReplayConfig, ReplayError,
    ReplaySession, RtpReceiver, SessionHandle, StreamFilter, SystemClock, VirtualClock,
};
pub use source::{CapturedPacket, Linktype, PacketSource, PcapFileSource, SourceError};
pub use streams::{
    CaptureSummary, InputInfo, ScanError, StreamKey, StreamReport, StreamSummary, scan_source,
    scan_streams,
};
