use thiserror::Error;

#[derive(Debug, Error)]
pub enum RtpError {
    #[error("payload too short for an RTP header: need {needed} bytes, got {actual}")]
    TooShort { needed: usize, actual: usize },
}
