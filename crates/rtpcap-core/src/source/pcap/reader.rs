use std::io::{Read, Seek, SeekFrom};

use super::error::PcapSourceError;
use super::layout;

/// Read the magic bytes and rewind the reader to the start.
///
/// # Errors
/// Returns `PcapSourceError` when the reader cannot be read or rewound.
pub fn read_magic_and_rewind<R: Read + Seek>(reader: &mut R) -> Result<[u8; 4], PcapSourceError> {
    let mut magic = [0u8; 4];
    reader.read_exact(&mut magic)?;
    reader.seek(SeekFrom::Start(0))?;
    Ok(magic)
}

/// Check whether the magic bytes match PCAPNG.
pub fn is_pcapng_magic(magic: &[u8; 4]) -> bool {
    magic == &layout::PCAPNG_MAGIC
}

/// Check whether the magic bytes match a legacy microsecond-resolution pcap
/// file, in either byte order.
///
/// The nanosecond-resolution variant (`0xA1B23C4D`) is deliberately not
/// accepted: record timestamps are combined assuming microsecond
/// sub-second units.
pub fn is_legacy_magic(magic: &[u8; 4]) -> bool {
    magic == &layout::PCAP_MAGIC_LE || magic == &layout::PCAP_MAGIC_BE
}

/// Combine a record header's seconds and microseconds fields into an
/// absolute capture timestamp in nanoseconds.
///
/// # Examples
/// This helper is part of an internal module, so the example is marked as
/// text example.
/// ```text
/// use rtpcap_core::source::pcap::reader::combine_timestamps;
///
/// assert_eq!(combine_timestamps(1, 500), 1_000_500_000);
/// ```
pub fn combine_timestamps(ts_sec: u32, ts_usec: u32) -> i64 {
    ts_sec as i64 * layout::NANOS_PER_SEC + ts_usec as i64 * layout::NANOS_PER_MICRO
}
