//! Timed replay of one RTP stream from a capture file.
//!
//! A session delivers decoded RTP packets with the inter-packet spacing
//! recorded in the capture. The first delivered packet fixes a single
//! media-to-wall-clock offset; every later packet sleeps until its
//! absolute deadline against that offset, so scheduling error never
//! accumulates across packets. A session that falls behind delivers late
//! rather than dropping.

pub mod clock;
pub mod loss;

pub use clock::{Clock, SystemClock, VirtualClock};
pub use loss::{LossError, LossProfile, PacketLossModel};

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use log::debug;
use thiserror::Error;

use crate::decode::{RtpPacket, RtpPipeline};
use crate::source::{PacketSource, PcapFileSource, SourceError};

/// Pacing sleeps run in slices of this length so a cross-thread `close()`
/// is observed promptly.
const SLEEP_SLICE: Duration = Duration::from_millis(10);

/// Sleeps longer than this get a debug note; they usually mean a sparse
/// capture rather than a pacing bug.
const LONG_SLEEP_NANOS: i64 = 30_000_000;

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("replay session is closed")]
    Closed,
    #[error(transparent)]
    Source(#[from] SourceError),
}

/// The receive surface a replay session exposes to media consumers.
///
/// `receive` blocks until the next matching packet is due. `Ok(None)`
/// signals a clean end of stream and is returned again on further calls;
/// after `close`, calls fail with [`ReplayError::Closed`].
pub trait RtpReceiver {
    fn receive(&mut self) -> Result<Option<RtpPacket>, ReplayError>;
    fn close(&mut self);
    fn is_open(&self) -> bool;
}

/// Which packets a replay session delivers. `None` fields match anything.
///
/// Both criteria are evaluated independently; a packet must satisfy both.
/// RTCP packets are excluded before filtering and can never be delivered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamFilter {
    pub ssrc: Option<u32>,
    pub payload_type: Option<u8>,
}

impl StreamFilter {
    /// Match every RTP packet in the file.
    pub fn any() -> Self {
        Self::default()
    }

    pub fn for_ssrc(ssrc: u32) -> Self {
        Self {
            ssrc: Some(ssrc),
            payload_type: None,
        }
    }

    fn matches(&self, packet: &RtpPacket) -> bool {
        self.ssrc.is_none_or(|ssrc| ssrc == packet.ssrc)
            && self
                .payload_type
                .is_none_or(|pt| pt == packet.payload_type)
    }
}

/// Replay session settings.
///
/// `preroll` inserts one fixed delay before the first packet is delivered,
/// giving downstream consumers time to come up; pacing is unaffected
/// because the media offset is taken after the delay.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReplayConfig {
    pub filter: StreamFilter,
    pub preroll: Option<Duration>,
}

/// Media-to-wall-clock offset, fixed by the first delivered packet.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaybackClock {
    offset_nanos: Option<i64>,
}

impl PlaybackClock {
    pub fn is_initialized(&self) -> bool {
        self.offset_nanos.is_some()
    }

    fn initialize(&mut self, now_nanos: i64, media_ts_nanos: i64) {
        self.offset_nanos = Some(now_nanos - media_ts_nanos);
    }

    fn deadline(&self, media_ts_nanos: i64) -> Option<i64> {
        self.offset_nanos.map(|offset| media_ts_nanos + offset)
    }
}

/// Cross-thread cancellation handle for a [`ReplaySession`].
///
/// Cloning is cheap; all clones observe the same session. Closing through
/// a handle causes a `receive()` blocked in its pacing sleep to return
/// [`ReplayError::Closed`] within one sleep slice.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    closed: Arc<AtomicBool>,
}

impl SessionHandle {
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    pub fn is_open(&self) -> bool {
        !self.closed.load(Ordering::SeqCst)
    }
}

/// A blocking, single-consumer replay of one capture file.
///
/// The file is read exactly once, in order; there is no rewind. `receive`
/// takes `&mut self`, so packet delivery is serialized by construction,
/// while [`SessionHandle`] allows any thread to close the session.
pub struct ReplaySession {
    pipeline: Option<RtpPipeline>,
    clock: Box<dyn Clock + Send>,
    playback: PlaybackClock,
    filter: StreamFilter,
    preroll: Option<Duration>,
    loss: Option<PacketLossModel>,
    closed: Arc<AtomicBool>,
    finished: bool,
}

impl ReplaySession {
    /// Open a capture file for timed replay against the real clock.
    ///
    /// # Examples
    /// ```no_run
    /// use std::path::Path;
    ///
    /// use rtpcap_core::{ReplayConfig, ReplaySession, RtpReceiver, StreamFilter};
    ///
    /// let config = ReplayConfig {
    ///     filter: StreamFilter::for_ssrc(0xDEADBEEF),
    ///     ..ReplayConfig::default()
    /// };
    /// let mut session = ReplaySession::open(Path::new("media.pcap"), config)?;
    /// while let Some(packet) = session.receive()? {
    ///     println!("{} bytes at {}", packet.len(), packet.timestamp_nanos);
    /// }
    /// # Ok::<(), rtpcap_core::ReplayError>(())
    /// ```
    pub fn open(path: &Path, config: ReplayConfig) -> Result<Self, ReplayError> {
        Self::open_with_clock(path, config, Box::new(SystemClock::new()))
    }

    /// Open a capture file, pacing against the supplied clock.
    pub fn open_with_clock(
        path: &Path,
        config: ReplayConfig,
        clock: Box<dyn Clock + Send>,
    ) -> Result<Self, ReplayError> {
        let source = PcapFileSource::open(path)?;
        Ok(Self::from_source(Box::new(source), config, clock))
    }

    /// Build a session over any packet source.
    pub fn from_source(
        source: Box<dyn PacketSource + Send>,
        config: ReplayConfig,
        clock: Box<dyn Clock + Send>,
    ) -> Self {
        Self {
            pipeline: Some(RtpPipeline::new(source)),
            clock,
            playback: PlaybackClock::default(),
            filter: config.filter,
            preroll: config.preroll,
            loss: None,
            closed: Arc::new(AtomicBool::new(false)),
            finished: false,
        }
    }

    /// Install a packet-loss simulator; dropped packets are consumed
    /// silently after filter matching.
    pub fn set_loss_model(&mut self, model: PacketLossModel) {
        self.loss = Some(model);
    }

    pub fn handle(&self) -> SessionHandle {
        SessionHandle {
            closed: Arc::clone(&self.closed),
        }
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Pull decoded packets until one passes the filter (and survives the
    /// loss model), or the capture ends.
    fn next_matching(&mut self) -> Result<Option<RtpPacket>, ReplayError> {
        loop {
            if self.is_closed() {
                return Err(ReplayError::Closed);
            }
            let pipeline = match self.pipeline.as_mut() {
                Some(pipeline) => pipeline,
                None => return Err(ReplayError::Closed),
            };
            let packet = match pipeline.next_rtp()? {
                Some(packet) => packet,
                None => return Ok(None),
            };
            if !self.filter.matches(&packet) {
                continue;
            }
            if let Some(loss) = self.loss.as_mut() {
                if loss.should_drop() {
                    debug!("loss model dropped packet ssrc {:#010x}", packet.ssrc);
                    continue;
                }
            }
            return Ok(Some(packet));
        }
    }

    /// Sleep in bounded slices until `deadline`, bailing out if the
    /// session is closed. A deadline in the past returns immediately: the
    /// engine delivers late instead of dropping.
    fn sleep_until(&self, deadline_nanos: i64) -> Result<(), ReplayError> {
        let pending = deadline_nanos - self.clock.now_nanos();
        if pending > LONG_SLEEP_NANOS {
            debug!("pacing sleep of {} ms", pending / 1_000_000);
        }
        loop {
            if self.is_closed() {
                return Err(ReplayError::Closed);
            }
            let now = self.clock.now_nanos();
            if now >= deadline_nanos {
                return Ok(());
            }
            let remaining = Duration::from_nanos((deadline_nanos - now) as u64);
            self.clock.sleep(remaining.min(SLEEP_SLICE));
        }
    }

    fn sleep_for(&self, duration: Duration) -> Result<(), ReplayError> {
        let deadline = self.clock.now_nanos() + duration.as_nanos() as i64;
        self.sleep_until(deadline)
    }
}

impl RtpReceiver for ReplaySession {
    fn receive(&mut self) -> Result<Option<RtpPacket>, ReplayError> {
        if self.is_closed() {
            return Err(ReplayError::Closed);
        }
        if self.finished {
            return Ok(None);
        }

        let packet = match self.next_matching()? {
            Some(packet) => packet,
            None => {
                self.finished = true;
                return Ok(None);
            }
        };

        match self.playback.deadline(packet.timestamp_nanos) {
            None => {
                if let Some(preroll) = self.preroll {
                    self.sleep_for(preroll)?;
                }
                // First delivery anchors the pacing reference point and
                // goes out immediately.
                self.playback
                    .initialize(self.clock.now_nanos(), packet.timestamp_nanos);
            }
            Some(deadline) => self.sleep_until(deadline)?,
        }

        Ok(Some(packet))
    }

    fn close(&mut self) {
        self.closed.store(true, Ordering::SeqCst);
        // Release the file handle right away.
        self.pipeline = None;
    }

    fn is_open(&self) -> bool {
        !self.is_closed()
    }
}

#[cfg(test)]
mod tests {
    use super::{PlaybackClock, ReplayConfig, ReplaySession, RtpReceiver, StreamFilter, VirtualClock};
    use crate::decode::RtpPacket;
    use crate::source::{CapturedPacket, PacketSource, SourceError};
    use std::net::Ipv4Addr;

    fn packet(ssrc: u32, payload_type: u8) -> RtpPacket {
        RtpPacket {
            timestamp_nanos: 0,
            ssrc,
            payload_type,
            marker: false,
            protocol: 17,
            src_ip: Ipv4Addr::new(10, 0, 0, 1),
            src_port: 5004,
            dst_ip: Ipv4Addr::new(10, 0, 0, 2),
            dst_port: 5006,
            data: vec![0u8; 12],
        }
    }

    #[test]
    fn wildcard_filter_matches_everything() {
        let filter = StreamFilter::any();
        assert!(filter.matches(&packet(1, 0)));
        assert!(filter.matches(&packet(0xFFFF_FFFF, 127)));
    }

    #[test]
    fn ssrc_and_payload_type_are_independent() {
        let filter = StreamFilter {
            ssrc: Some(7),
            payload_type: Some(96),
        };
        assert!(filter.matches(&packet(7, 96)));
        assert!(!filter.matches(&packet(7, 8)));
        assert!(!filter.matches(&packet(8, 96)));

        let ssrc_only = StreamFilter::for_ssrc(7);
        assert!(ssrc_only.matches(&packet(7, 8)));
        assert!(ssrc_only.matches(&packet(7, 96)));
    }

    #[test]
    fn playback_clock_initializes_once() {
        let mut playback = PlaybackClock::default();
        assert!(!playback.is_initialized());
        assert_eq!(playback.deadline(500), None);

        playback.initialize(1_000, 400);
        assert!(playback.is_initialized());
        assert_eq!(playback.deadline(400), Some(1_000));
        assert_eq!(playback.deadline(900), Some(1_500));
    }

    struct VecSource(std::vec::IntoIter<CapturedPacket>);

    impl PacketSource for VecSource {
        fn next_packet(&mut self) -> Result<Option<CapturedPacket>, SourceError> {
            Ok(self.0.next())
        }
    }

    #[test]
    fn empty_source_ends_immediately_and_stays_ended() {
        let source = VecSource(Vec::new().into_iter());
        let mut session = ReplaySession::from_source(
            Box::new(source),
            ReplayConfig::default(),
            Box::new(VirtualClock::new()),
        );
        assert!(session.receive().unwrap().is_none());
        assert!(session.receive().unwrap().is_none());
        assert!(session.is_open());
    }

    #[test]
    fn close_rejects_further_receives() {
        let source = VecSource(Vec::new().into_iter());
        let mut session = ReplaySession::from_source(
            Box::new(source),
            ReplayConfig::default(),
            Box::new(VirtualClock::new()),
        );
        session.close();
        assert!(!session.is_open());
        assert!(matches!(
            session.receive(),
            Err(super::ReplayError::Closed)
        ));
    }
}
