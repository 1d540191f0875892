//! Legacy PCAP file source.
//!
//! This module provides a `PacketSource` backed by a classic (microsecond
//! resolution) pcap file. It owns the file handle and the low-level record
//! parsing, emitting raw frames plus capture timestamps for the decode
//! pipeline. pcapng captures are rejected at open.

pub mod error;
pub mod layout;
pub mod parser;
pub mod reader;

pub use parser::PcapFileSource;
