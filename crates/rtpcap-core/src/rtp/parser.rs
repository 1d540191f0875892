use super::error::RtpError;
use super::layout;

/// Identification fields of an RTP packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RtpHeader {
    pub ssrc: u32,
    pub payload_type: u8,
    pub marker: bool,
}

/// Interpret a UDP payload as an RTP packet.
///
/// Requires only the 12-byte fixed header; no version check is performed,
/// matching what replay consumers actually need from a capture.
pub fn parse_rtp_header(payload: &[u8]) -> Result<RtpHeader, RtpError> {
    if payload.len() < layout::MIN_HEADER_LEN {
        return Err(RtpError::TooShort {
            needed: layout::MIN_HEADER_LEN,
            actual: payload.len(),
        });
    }

    let flags = payload[layout::FLAGS_OFFSET];
    let ssrc_bytes: [u8; 4] = payload[layout::SSRC_RANGE]
        .try_into()
        .map_err(|_| RtpError::TooShort {
            needed: layout::MIN_HEADER_LEN,
            actual: payload.len(),
        })?;

    Ok(RtpHeader {
        ssrc: u32::from_be_bytes(ssrc_bytes),
        payload_type: flags & layout::PAYLOAD_TYPE_MASK,
        marker: flags & layout::MARKER_MASK != 0,
    })
}

/// True for payload types claimed by RTCP SR/RR/SDES/BYE/APP packets.
pub fn is_rtcp_payload_type(payload_type: u8) -> bool {
    layout::RTCP_PAYLOAD_TYPES.contains(&payload_type)
}
