use thiserror::Error;

/// Errors returned by link stripping and IPv4/UDP decoding.
///
/// All of these are skippable at the pipeline level: a frame that fails
/// here is dropped and the next record is read.
#[derive(Debug, Error)]
pub enum WireError {
    #[error("frame too short: need {needed} bytes, got {actual}")]
    TooShort { needed: usize, actual: usize },
    #[error("no IPv4 ethertype marker found in frame of {frame_len} bytes")]
    NoIpv4Marker { frame_len: usize },
}
