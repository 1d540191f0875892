use std::fs::File;
use std::path::Path;

use log::{debug, warn};
use pcap_parser::{LegacyPcapReader, Linktype, PcapBlockOwned, traits::PcapReaderIterator};

use crate::source::{CapturedPacket, PacketSource, SourceError};
use crate::wire;

use super::error::PcapSourceError;
use super::layout;
use super::reader::{combine_timestamps, is_legacy_magic, is_pcapng_magic, read_magic_and_rewind};

/// Single-pass reader over a legacy pcap capture file.
///
/// The link-layer type is taken from the global header and fixed for the
/// lifetime of the source. Reaching the end of the file at a record
/// boundary yields `Ok(None)`; a record that can never be completed is a
/// format error.
pub struct PcapFileSource {
    reader: LegacyPcapReader<File>,
    linktype: Option<Linktype>,
    record_index: usize,
    last_incomplete: Option<usize>,
}

impl PcapFileSource {
    pub fn open(path: &Path) -> Result<Self, SourceError> {
        let mut file = File::open(path).map_err(SourceError::from)?;

        let magic = read_magic_and_rewind(&mut file).map_err(SourceError::from)?;
        if is_pcapng_magic(&magic) {
            return Err(SourceError::from(PcapSourceError::Pcap {
                context: "open",
                message: "pcapng captures are not supported".to_string(),
            }));
        }
        if !is_legacy_magic(&magic) {
            return Err(SourceError::from(PcapSourceError::Pcap {
                context: "open",
                message: format!("not a pcap capture (magic {magic:02x?})"),
            }));
        }

        let reader =
            LegacyPcapReader::new(layout::PCAP_READER_BUFFER_SIZE, file).map_err(|e| {
                SourceError::from(PcapSourceError::Pcap {
                    context: "pcap reader init",
                    message: e.to_string(),
                })
            })?;
        Ok(Self {
            reader,
            linktype: None,
            record_index: 0,
            last_incomplete: None,
        })
    }
}

impl PacketSource for PcapFileSource {
    fn next_packet(&mut self) -> Result<Option<CapturedPacket>, SourceError> {
        next_packet(self).map_err(SourceError::from)
    }
}

fn next_packet(source: &mut PcapFileSource) -> Result<Option<CapturedPacket>, PcapSourceError> {
    loop {
        match source.reader.next() {
            Ok((offset, block)) => {
                let event = match block {
                    PcapBlockOwned::LegacyHeader(header) => {
                        if !wire::is_known_linktype(header.network) {
                            warn!(
                                "unrecognized link type {}, frames will use the ethertype scan fallback",
                                header.network.0
                            );
                        }
                        source.linktype = Some(header.network);
                        None
                    }
                    PcapBlockOwned::Legacy(packet) => {
                        let timestamp_nanos = combine_timestamps(packet.ts_sec, packet.ts_usec);
                        let linktype = source.linktype.unwrap_or(Linktype::ETHERNET);
                        Some(CapturedPacket {
                            timestamp_nanos,
                            linktype,
                            data: packet.data.to_vec(),
                        })
                    }
                    _ => None,
                };
                source.reader.consume(offset);
                source.record_index += 1;
                if event.is_some() {
                    return Ok(event);
                }
            }
            Err(pcap_parser::PcapError::Eof) => return Ok(None),
            Err(pcap_parser::PcapError::Incomplete(_)) => {
                // A second Incomplete on the same record means the refill
                // made no progress: the file ends mid-record.
                if source.last_incomplete == Some(source.record_index) {
                    return Err(PcapSourceError::Truncated {
                        record: source.record_index,
                    });
                }
                source.last_incomplete = Some(source.record_index);
                debug!("refilling pcap read buffer at record {}", source.record_index);
                source.reader.refill().map_err(|e| PcapSourceError::Pcap {
                    context: "pcap reader refill",
                    message: e.to_string(),
                })?;
            }
            Err(e) => {
                return Err(PcapSourceError::Pcap {
                    context: "pcap reader next",
                    message: e.to_string(),
                });
            }
        }
    }
}
