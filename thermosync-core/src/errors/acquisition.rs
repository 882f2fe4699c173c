use std::io;

#[derive(Debug, thiserror::Error)]
pub enum AcquisitionError {
    #[error("Device I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Device reported a checksum failure")]
    CrcMismatch,

    #[error("Malformed device payload: {0}")]
    Malformed(String),

    #[error("Bus error: {0}")]
    Bus(String),

    #[error("Device did not respond in time")]
    Timeout,
}
