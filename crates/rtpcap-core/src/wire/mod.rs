//! Link-layer stripping and IPv4/UDP decoding.
//!
//! Frames are unwrapped with fixed-offset arithmetic matching what RTP
//! capture tooling actually writes: a 14-byte Ethernet or 16-byte Linux
//! cooked header, then a 20-byte IPv4 header without options, then an
//! 8-byte UDP header. Unrecognized link types fall back to scanning for
//! the IPv4 ethertype marker.

pub mod error;
pub mod layout;
pub mod link;
pub mod reader;
pub mod transport;

pub use error::WireError;
pub use link::{is_known_linktype, strip_link_header};
pub use transport::{Transport, UdpDatagram, parse_ipv4};
