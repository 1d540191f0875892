/// On-disk magic for a little-endian legacy pcap file.
pub const PCAP_MAGIC_LE: [u8; 4] = [0xd4, 0xc3, 0xb2, 0xa1];
/// On-disk magic for a big-endian legacy pcap file.
pub const PCAP_MAGIC_BE: [u8; 4] = [0xa1, 0xb2, 0xc3, 0xd4];
/// PCAPNG section header magic.
pub const PCAPNG_MAGIC: [u8; 4] = [0x0a, 0x0d, 0x0d, 0x0a];

pub const PCAP_READER_BUFFER_SIZE: usize = 65536;

pub const NANOS_PER_SEC: i64 = 1_000_000_000;
pub const NANOS_PER_MICRO: i64 = 1_000;
