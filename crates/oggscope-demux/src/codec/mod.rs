//! Codec handler contract and the ordered registry of handlers.
//!
//! A [`CodecHandler`] is a stateless descriptor: it owns the magic bytes used
//! to recognize a stream and creates one [`CodecState`] per bound stream. The
//! state sees the header packets, may annotate data packets, and translates
//! granule positions into timestamps.
//!
//! The registry is checked top to bottom and the first match wins, so a more
//! specific magic must be registered before a shorter one it also satisfies.

pub mod flac;
pub mod opus;
pub mod theora;
pub mod vorbis;

use std::fmt;
use std::sync::Arc;

use crate::page::PageFlags;
use crate::types::StreamInfo;

pub use flac::FlacHandler;
pub use opus::OpusHandler;
pub use theora::TheoraHandler;
pub use vorbis::VorbisHandler;

/// Verdict of a codec on a packet seen during the header phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderOutcome {
    /// Consumed as a header; not delivered to the caller.
    IsHeader,
    /// First data packet; the stream switches to data mode.
    NotHeader,
    /// The packet claims to be a header but cannot be parsed.
    Malformed(String),
}

/// Mutable view of an in-flight data packet offered to [`CodecState::packet`].
#[derive(Debug, Clone, Copy, Default)]
pub struct PacketMeta {
    pub keyframe: bool,
    pub duration: Option<i64>,
    /// Samples to drop from the end of the decoded packet.
    pub end_trim: Option<i64>,
    /// Flags of the page on which the packet completed.
    pub page_flags: PageFlags,
    /// Page granule, set only for the last packet completed on the page.
    pub granule: Option<u64>,
}

/// Codec descriptor registered in a [`CodecRegistry`].
pub trait CodecHandler: Send + Sync {
    /// Short codec name, e.g. `"vorbis"`.
    fn name(&self) -> &'static str;

    /// Leading bytes of the first packet of a stream using this codec.
    fn magic(&self) -> &'static [u8];

    /// Exact prefix match against [`CodecHandler::magic`].
    fn identify(&self, prefix: &[u8]) -> bool {
        prefix.starts_with(self.magic())
    }

    /// Header packets a well-formed stream carries.
    fn expected_header_count(&self) -> u32;

    /// Whether a page's granule position marks the start of its last packet
    /// rather than the end.
    fn granule_is_start(&self) -> bool {
        false
    }

    /// Fresh per-stream state.
    fn new_state(&self) -> Box<dyn CodecState>;
}

/// Per-stream codec state.
pub trait CodecState: Send + fmt::Debug {
    /// Inspect a packet while the stream is in its header phase.
    fn header(&mut self, packet: &[u8], info: &mut StreamInfo) -> HeaderOutcome;

    /// Annotate a data packet (keyframe flag, duration).
    fn packet(&mut self, _packet: &[u8], _meta: &mut PacketMeta) {}

    /// Translate a granule position into `(pts, dts)`.
    ///
    /// Without a codec-specific mapping the granule is used as both. Values
    /// beyond `i64::MAX` have no timestamp.
    fn granule_to_ts(&self, granule: u64) -> (Option<i64>, Option<i64>) {
        let ts = i64::try_from(granule).ok();
        (ts, ts)
    }

    /// Forget position-dependent state after the demuxer moved.
    ///
    /// `at_start` is set when the new position is the first data page.
    fn reset(&mut self, _at_start: bool) {}

    /// Called when the stream is replaced or the demuxer closes.
    fn cleanup(&mut self) {}

    /// Deep copy for snapshots.
    fn box_clone(&self) -> Box<dyn CodecState>;
}

impl Clone for Box<dyn CodecState> {
    fn clone(&self) -> Self {
        self.box_clone()
    }
}

/// A handler bound to one logical stream, together with that stream's state.
#[derive(Clone)]
pub struct BoundCodec {
    pub handler: Arc<dyn CodecHandler>,
    pub state: Box<dyn CodecState>,
}

impl BoundCodec {
    pub fn new(handler: Arc<dyn CodecHandler>) -> Self {
        let state = handler.new_state();
        Self { handler, state }
    }

    pub fn name(&self) -> &'static str {
        self.handler.name()
    }
}

impl fmt::Debug for BoundCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundCodec")
            .field("handler", &self.handler.name())
            .field("state", &self.state)
            .finish()
    }
}

/// Ordered list of codec handlers; the first one to identify a stream wins.
#[derive(Clone, Default)]
pub struct CodecRegistry {
    handlers: Vec<Arc<dyn CodecHandler>>,
}

impl CodecRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in Theora, Vorbis, Opus and FLAC handlers.
    pub fn with_defaults() -> Self {
        Self::new()
            .with(TheoraHandler)
            .with(VorbisHandler)
            .with(OpusHandler)
            .with(FlacHandler)
    }

    /// Append a handler, builder style.
    pub fn with(mut self, handler: impl CodecHandler + 'static) -> Self {
        self.register(Arc::new(handler));
        self
    }

    /// Append a handler after every existing one.
    pub fn register(&mut self, handler: Arc<dyn CodecHandler>) {
        self.handlers.push(handler);
    }

    /// First handler whose magic prefixes `packet`.
    pub fn find(&self, packet: &[u8]) -> Option<Arc<dyn CodecHandler>> {
        self.handlers.iter().find(|h| h.identify(packet)).cloned()
    }

    /// Registered handler names, in lookup order.
    pub fn names(&self) -> Vec<&'static str> {
        self.handlers.iter().map(|h| h.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl fmt::Debug for CodecRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}
