use thiserror::Error;

/// Failures of the call codec.
///
/// The coalescing groups have no error type of their own; whatever the wrapped
/// operation returns is handed to every caller untouched.
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to encode message: {0}")]
    Encode(String),
    #[error("Failed to decode message: {0}")]
    Decode(String),
    #[error("Frame of {size} bytes exceeds the limit of {limit} bytes")]
    FrameTooLarge { size: usize, limit: usize },
    #[error("Unknown content type: {0}")]
    UnknownContentType(String),
    #[error("Stream closed")]
    Closed,
}

impl From<bincode::error::EncodeError> for CodecError {
    fn from(err: bincode::error::EncodeError) -> Self {
        CodecError::Encode(err.to_string())
    }
}

impl From<bincode::error::DecodeError> for CodecError {
    fn from(err: bincode::error::DecodeError) -> Self {
        CodecError::Decode(err.to_string())
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
}
