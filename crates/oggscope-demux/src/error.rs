//! Error types for oggscope-demux.

use std::io;
use thiserror::Error;

/// Result type for oggscope-demux operations.
pub type Result<T> = std::result::Result<T, DemuxError>;

/// Error type for demuxer operations.
#[derive(Debug, Error)]
pub enum DemuxError {
    /// I/O error from the byte source.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Clean end of the byte source at a page boundary.
    #[error("End of stream")]
    Eof,

    /// No page marker within the scan window.
    #[error("No page marker found within {window} bytes of offset {offset}")]
    SyncNotFound { offset: u64, window: usize },

    /// Page header carries a version other than 0.
    #[error("Unsupported page version {version} at offset {offset}")]
    UnsupportedVersion { offset: u64, version: u8 },

    /// Short read inside a page.
    #[error("Truncated {what} at offset {offset}")]
    Truncated { offset: u64, what: &'static str },

    /// No registered codec handler matched a stream's first packet.
    #[error("No codec handler recognizes stream with serial {serial:#010x}")]
    UnrecognizedCodec { serial: u32 },

    /// A new serial appeared after data while several streams are active.
    #[error("Cannot replace stream with serial {serial:#010x}: {active} streams are active")]
    MultistreamReplaceUnsupported { serial: u32, active: usize },

    /// A codec handler rejected a header packet.
    #[error("Header parse failure on stream {serial:#010x}: {reason}")]
    HeaderParseFailure { serial: u32, reason: String },

    /// Fewer header packets than the handler expects.
    #[error("Stream {stream} expected {expected} header packets, received {received}")]
    HeaderCountMismatch {
        stream: usize,
        expected: u32,
        received: u32,
    },

    /// A stream buffer could not grow.
    #[error("Cannot grow stream buffer to {requested} bytes")]
    AllocationFailure { requested: usize },

    /// Operation requires a seekable source.
    #[error("Byte source is not seekable")]
    NotSeekable,

    /// The source ended before any stream could be identified.
    #[error("No identifiable streams found")]
    NoStreams,

    /// Stream index out of range.
    #[error("Invalid stream index: {0}")]
    InvalidStream(usize),

    /// The timestamp search could not locate the target.
    #[error("Seek to {target} on stream {stream} failed")]
    SeekFailed { stream: usize, target: i64 },
}

impl DemuxError {
    /// Create a header parse failure.
    pub fn header(serial: u32, reason: impl Into<String>) -> Self {
        Self::HeaderParseFailure {
            serial,
            reason: reason.into(),
        }
    }

    /// Create a truncation error.
    pub fn truncated(offset: u64, what: &'static str) -> Self {
        Self::Truncated { offset, what }
    }

    /// Whether this is the end of the source, clean or truncated.
    pub fn is_eof(&self) -> bool {
        matches!(self, Self::Eof | Self::Truncated { .. })
    }

    /// Whether the demuxer can keep going after this error.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::UnrecognizedCodec { .. } | Self::HeaderCountMismatch { .. })
    }
}
