use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid hex digest: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    #[error("invalid digest length {got}: expected 32 bytes")]
    InvalidDigestLength { got: usize },

    #[error("message too long: total length exceeds 2^64 - 1 bits")]
    MessageTooLong,

    #[error("chunk size must be greater than zero")]
    InvalidChunkSize,

    #[error("read failed: {0}")]
    Io(#[from] std::io::Error),
}
