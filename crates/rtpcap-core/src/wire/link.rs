use pcap_parser::Linktype;

use super::error::WireError;
use super::layout;
use super::reader::WireReader;

/// Whether a link type has an explicit fixed-size header skip.
///
/// Anything else goes through the ethertype scan fallback.
pub fn is_known_linktype(linktype: Linktype) -> bool {
    linktype.0 == layout::LINKTYPE_ETHERNET || linktype.0 == layout::LINKTYPE_LINUX_SLL
}

/// Remove the link-layer envelope from a captured frame, exposing the IP
/// packet.
///
/// Ethernet and Linux cooked capture use their fixed header sizes. Other
/// link types fall back to scanning for the IPv4 ethertype marker, a
/// legacy heuristic kept for captures whose global header lies about the
/// framing; it only recognizes Ethernet-like frames carrying IPv4.
pub fn strip_link_header(linktype: Linktype, frame: &[u8]) -> Result<&[u8], WireError> {
    let reader = WireReader::new(frame);
    match linktype.0 {
        layout::LINKTYPE_ETHERNET => {
            reader.require_len(layout::ETHERNET_HEADER_LEN)?;
            reader.slice_from(layout::ETHERNET_HEADER_LEN)
        }
        layout::LINKTYPE_LINUX_SLL => {
            reader.require_len(layout::SLL_HEADER_LEN)?;
            reader.slice_from(layout::SLL_HEADER_LEN)
        }
        _ => scan_for_ipv4(frame),
    }
}

/// Walk 4-byte words from a 2-byte offset until one ends in the IPv4
/// ethertype (`08 00`); the IP packet starts right after that word.
fn scan_for_ipv4(frame: &[u8]) -> Result<&[u8], WireError> {
    let mut offset = layout::SCAN_START_OFFSET;
    while offset + layout::SCAN_WORD_LEN <= frame.len() {
        let word = &frame[offset..offset + layout::SCAN_WORD_LEN];
        offset += layout::SCAN_WORD_LEN;
        if word[2..4] == layout::ETHERTYPE_IPV4 {
            return Ok(&frame[offset..]);
        }
    }
    Err(WireError::NoIpv4Marker {
        frame_len: frame.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::{is_known_linktype, strip_link_header};
    use crate::wire::error::WireError;
    use crate::wire::layout;
    use pcap_parser::Linktype;

    fn ethernet_frame(payload: &[u8]) -> Vec<u8> {
        let mut frame = vec![0u8; layout::ETHERNET_HEADER_LEN];
        frame[12] = 0x08;
        frame[13] = 0x00;
        frame.extend_from_slice(payload);
        frame
    }

    #[test]
    fn ethernet_skips_fixed_header() {
        let frame = ethernet_frame(&[0x45, 0xAA, 0xBB]);
        let ip = strip_link_header(Linktype::ETHERNET, &frame).unwrap();
        assert_eq!(ip, &[0x45, 0xAA, 0xBB]);
    }

    #[test]
    fn linux_cooked_skips_fixed_header() {
        let mut frame = vec![0u8; layout::SLL_HEADER_LEN];
        frame.extend_from_slice(&[0x45, 0x01]);
        let ip = strip_link_header(Linktype(layout::LINKTYPE_LINUX_SLL), &frame).unwrap();
        assert_eq!(ip, &[0x45, 0x01]);
    }

    #[test]
    fn unknown_linktype_scans_for_ethertype() {
        // A plain Ethernet frame still works through the scan: the
        // ethertype at bytes 12..14 terminates the word at 10..14.
        let frame = ethernet_frame(&[0xDE, 0xAD]);
        let ip = strip_link_header(Linktype(147), &frame).unwrap();
        assert_eq!(ip, &[0xDE, 0xAD]);
    }

    #[test]
    fn scan_without_marker_fails() {
        let frame = vec![0u8; 32];
        let err = strip_link_header(Linktype(147), &frame).unwrap_err();
        assert!(matches!(err, WireError::NoIpv4Marker { frame_len: 32 }));
    }

    #[test]
    fn short_frames_are_too_short() {
        let frame = vec![0u8; 10];
        let err = strip_link_header(Linktype::ETHERNET, &frame).unwrap_err();
        assert!(matches!(err, WireError::TooShort { needed: 14, .. }));
    }

    #[test]
    fn known_linktypes() {
        assert!(is_known_linktype(Linktype::ETHERNET));
        assert!(is_known_linktype(Linktype(113)));
        assert!(!is_known_linktype(Linktype(147)));
    }
}
