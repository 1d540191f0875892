mod common;

use std::fs;

use rtpcap_core::{Linktype, PacketSource, PcapFileSource, SourceError};
use tempfile::TempDir;

#[test]
fn records_round_trip_in_file_order() {
    let temp = TempDir::new().expect("tempdir");
    let first = vec![0x11u8; 40];
    let second = vec![0x22u8; 7];
    let path = common::write_pcap(
        temp.path(),
        "roundtrip.pcap",
        1,
        &[(10, 250_000, first.clone()), (11, 0, second.clone())],
    );

    let mut source = PcapFileSource::open(&path).unwrap();

    let a = source.next_packet().unwrap().expect("first record");
    assert_eq!(a.timestamp_nanos, 10_250_000_000);
    assert_eq!(a.data, first);
    assert_eq!(a.linktype, Linktype::ETHERNET);

    let b = source.next_packet().unwrap().expect("second record");
    assert_eq!(b.timestamp_nanos, 11_000_000_000);
    assert_eq!(b.data, second);

    assert!(source.next_packet().unwrap().is_none());
}

#[test]
fn end_of_file_repeats_cleanly() {
    let temp = TempDir::new().expect("tempdir");
    let path = common::write_pcap(temp.path(), "empty.pcap", 1, &[]);

    let mut source = PcapFileSource::open(&path).unwrap();
    assert!(source.next_packet().unwrap().is_none());
    assert!(source.next_packet().unwrap().is_none());
}

#[test]
fn linktype_comes_from_global_header() {
    let temp = TempDir::new().expect("tempdir");
    let path = common::write_pcap(
        temp.path(),
        "cooked.pcap",
        113,
        &[(0, 0, vec![0u8; 20])],
    );

    let mut source = PcapFileSource::open(&path).unwrap();
    let packet = source.next_packet().unwrap().expect("record");
    assert_eq!(packet.linktype, Linktype(113));
}

#[test]
fn truncated_record_is_a_format_error() {
    let temp = TempDir::new().expect("tempdir");
    let mut bytes = common::pcap_bytes(1, &[]);
    // Record header promising 100 bytes, followed by only 10.
    bytes.extend_from_slice(&5u32.to_le_bytes());
    bytes.extend_from_slice(&0u32.to_le_bytes());
    bytes.extend_from_slice(&100u32.to_le_bytes());
    bytes.extend_from_slice(&100u32.to_le_bytes());
    bytes.extend_from_slice(&[0u8; 10]);
    let path = temp.path().join("truncated.pcap");
    fs::write(&path, bytes).unwrap();

    let mut source = PcapFileSource::open(&path).unwrap();
    let err = source.next_packet().unwrap_err();
    match err {
        SourceError::Format(message) => assert!(message.contains("truncated")),
        other => panic!("expected format error, got {other:?}"),
    }
}

#[test]
fn garbage_magic_is_rejected_at_open() {
    let temp = TempDir::new().expect("tempdir");
    let path = temp.path().join("garbage.pcap");
    fs::write(&path, [0x00u8, 0x11, 0x22, 0x33, 0x44, 0x55]).unwrap();

    let err = PcapFileSource::open(&path).unwrap_err();
    match err {
        SourceError::Format(message) => assert!(message.contains("not a pcap capture")),
        other => panic!("expected format error, got {other:?}"),
    }
}

#[test]
fn pcapng_is_rejected_at_open() {
    let temp = TempDir::new().expect("tempdir");
    let path = temp.path().join("modern.pcapng");
    fs::write(&path, [0x0au8, 0x0d, 0x0d, 0x0a, 0x1c, 0x00, 0x00, 0x00]).unwrap();

    let err = PcapFileSource::open(&path).unwrap_err();
    match err {
        SourceError::Format(message) => assert!(message.contains("pcapng")),
        other => panic!("expected format error, got {other:?}"),
    }
}

#[test]
fn short_file_is_an_io_error() {
    let temp = TempDir::new().expect("tempdir");
    let path = temp.path().join("tiny.pcap");
    fs::write(&path, [0xd4u8, 0xc3]).unwrap();

    let err = PcapFileSource::open(&path).unwrap_err();
    assert!(matches!(err, SourceError::Io(_)));
}
