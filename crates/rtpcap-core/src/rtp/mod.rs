//! Minimal RTP header view over a UDP payload.
//!
//! Only the fields needed for stream identification are decoded: payload
//! type (marker bit masked off), marker, and SSRC. Payload types in the
//! RTCP SR/RR/SDES/BYE/APP range are recognized so control packets can be
//! excluded from classification and replay.

pub mod error;
pub mod layout;
pub mod parser;

pub use error::RtpError;
pub use parser::{RtpHeader, is_rtcp_payload_type, parse_rtp_header};
