use thiserror::Error;

/// Main error type for index build and decode operations
#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Duplicate index document ID {0}")]
    DuplicateDocument(u32),

    #[error("Incorrect index file magic: expected {expected:#010x}, found {found:#010x}")]
    BadMagic { expected: u32, found: u32 },

    #[error("Unsupported index format version {found} (expected {expected})")]
    UnsupportedVersion { expected: u32, found: u32 },

    #[error("Unexpected end of index data")]
    UnexpectedEof,

    #[error("VLQ value exceeds 32 bits")]
    VlqOverflow,

    #[error("Decode stack underflow")]
    StackUnderflow,

    #[error("Unrecognized node kind {0} in structure encoding")]
    InvalidNodeKind(u32),

    #[error("Invalid structure encoding: {0}")]
    InvalidStructure(String),

    #[error("Invalid UTF-8 in index data: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    #[error("Invalid position encoding: {0}")]
    PositionDecode(#[from] base64::DecodeError),
}

/// Result type alias for index operations
pub type Result<T> = std::result::Result<T, SearchError>;
