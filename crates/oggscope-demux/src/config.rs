//! Demuxer configuration.

use crate::page::{MAX_PAGE_SIZE, PAGE_HEADER_SIZE};

/// Largest accepted sync window.
pub const MAX_SYNC_WINDOW: usize = 1024 * 1024;

/// Default ceiling for a single stream's reassembly buffer (64 MB).
pub const DEFAULT_MAX_BUFFER_SIZE: usize = 64 * 1024 * 1024;

/// What to do when a codec handler reports a malformed header packet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum HeaderErrorPolicy {
    /// Abort with [`DemuxError::HeaderParseFailure`](crate::DemuxError::HeaderParseFailure).
    #[default]
    Fatal,
    /// Treat the packet as the first data packet.
    FallThrough,
}

/// Tunables for [`OggDemuxer`](crate::OggDemuxer).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DemuxConfig {
    /// Bytes scanned for a page marker before giving up.
    pub sync_window: usize,

    /// Probe the stream durations while opening a seekable source.
    pub probe_duration: bool,

    /// Handling of malformed header packets.
    pub header_errors: HeaderErrorPolicy,

    /// Reject streams that delivered fewer headers than their codec expects.
    pub strict_header_count: bool,

    /// Upper bound for one stream's reassembly buffer.
    pub max_buffer_size: usize,
}

impl Default for DemuxConfig {
    fn default() -> Self {
        Self {
            sync_window: MAX_PAGE_SIZE,
            probe_duration: true,
            header_errors: HeaderErrorPolicy::Fatal,
            strict_header_count: false,
            max_buffer_size: DEFAULT_MAX_BUFFER_SIZE,
        }
    }
}

impl DemuxConfig {
    /// Check the values are usable, returning a description of the first problem.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.sync_window < PAGE_HEADER_SIZE || self.sync_window > MAX_SYNC_WINDOW {
            return Err(format!(
                "sync_window must be between {} and {} bytes, got {}",
                PAGE_HEADER_SIZE, MAX_SYNC_WINDOW, self.sync_window
            ));
        }
        if self.max_buffer_size < MAX_PAGE_SIZE {
            return Err(format!(
                "max_buffer_size must be at least one page ({} bytes), got {}",
                MAX_PAGE_SIZE, self.max_buffer_size
            ));
        }
        Ok(())
    }
}
