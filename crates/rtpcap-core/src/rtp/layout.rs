pub const MIN_HEADER_LEN: usize = 12;

pub const FLAGS_OFFSET: usize = 1;
pub const PAYLOAD_TYPE_MASK: u8 = 0x7F;
pub const MARKER_MASK: u8 = 0x80;

pub const SSRC_RANGE: std::ops::Range<usize> = 8..12;

/// Payload-type values used by RTCP SR/RR/SDES/BYE/APP when multiplexed
/// on the RTP port (RFC 3551).
pub const RTCP_PAYLOAD_TYPES: std::ops::RangeInclusive<u8> = 72..=76;
