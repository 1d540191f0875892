mod pcap;

pub use pcap::PcapFileSource;
pub use pcap_parser::Linktype;

use thiserror::Error;

/// One captured link-layer frame together with its capture timestamp.
///
/// The timestamp is the absolute capture time in nanoseconds, combined from
/// the record header's seconds and microseconds fields. Frames are yielded
/// in file order and are owned by the caller once returned.
#[derive(Debug, Clone)]
pub struct CapturedPacket {
    pub timestamp_nanos: i64,
    pub linktype: Linktype,
    pub data: Vec<u8>,
}

/// A single-pass supplier of captured frames.
///
/// `Ok(None)` means the source is exhausted; there is no rewind.
pub trait PacketSource {
    fn next_packet(&mut self) -> Result<Option<CapturedPacket>, SourceError>;
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("capture format error: {0}")]
    Format(String),
}

impl From<pcap::error::PcapSourceError> for SourceError {
    fn from(value: pcap::error::PcapSourceError) -> Self {
        match value {
            pcap::error::PcapSourceError::Io(err) => SourceError::Io(err),
            pcap::error::PcapSourceError::Pcap { context, message } => {
                SourceError::Format(format!("{context}: {message}"))
            }
            pcap::error::PcapSourceError::Truncated { record } => {
                SourceError::Format(format!("truncated capture at record {record}"))
            }
        }
    }
}
