use thiserror::Error;

/// Errors that can occur while encoding or inspecting an IAMF stream.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EncoderError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("allocation failed: {0}")]
    AllocationFailure(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("unsupported source: {0}")]
    UnsupportedSource(String),

    #[error("malformed stream: {0}")]
    MalformedStream(String),
}

impl EncoderError {
    /// Whether this error leaves an encoder session unusable.
    pub fn is_poisoning(&self) -> bool {
        matches!(self, Self::Io(_))
    }
}

impl From<std::io::Error> for EncoderError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, EncoderError>;
