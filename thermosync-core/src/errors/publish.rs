use std::io;

#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("Sink I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Sink did not respond in time")]
    Timeout,
}
