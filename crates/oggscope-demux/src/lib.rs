//! # oggscope-demux
//!
//! Pure Rust demultiplexer for Ogg page streams.
//!
//! The demuxer reads pages from a [`ByteSource`], reassembles the packets of
//! every interleaved logical stream, binds a codec handler to each stream
//! from its first packet, and turns granule positions into timestamps.
//!
//! ## Features
//!
//! - Page sync and parsing with a bounded scan window
//! - Packet reassembly across segments and pages, with loss detection
//! - Pluggable codec handlers; Theora, Vorbis, Opus and FLAC built in
//! - Deferred granule semantics for codecs whose granule marks a packet end
//! - Duration probing from the file tail without moving the read position
//! - Timestamp search and keyframe-aware seeking
//!
//! ## Example
//!
//! ```no_run
//! use oggscope_demux::{DemuxConfig, OggDemuxer};
//!
//! let mut demuxer = OggDemuxer::open_path("music.ogg", DemuxConfig::default()).unwrap();
//!
//! for stream in demuxer.streams() {
//!     println!("#{} {:?} {}", stream.index, stream.codec, stream.time_base);
//! }
//! println!("Duration: {:?}", demuxer.duration());
//!
//! while let Some(packet) = demuxer.next_packet().unwrap() {
//!     println!("{} bytes on stream {} pts={:?}", packet.len(), packet.stream_index, packet.pts);
//! }
//! ```

pub mod codec;
pub mod config;
pub mod error;
pub mod page;
pub mod search;
pub mod source;
pub mod types;

mod assembler;
mod demuxer;
mod duration;
mod seek;
mod snapshot;
mod stream;
mod timestamp;

pub use codec::{CodecHandler, CodecRegistry, CodecState, HeaderOutcome, PacketMeta};
pub use config::{DemuxConfig, HeaderErrorPolicy};
pub use demuxer::OggDemuxer;
pub use error::{DemuxError, Result};
pub use page::{PageFlags, PageHeader};
pub use search::TimestampSource;
pub use snapshot::RestoreMode;
pub use source::{ByteSource, ForwardSource, ReaderSource};
pub use stream::StreamPhase;
pub use types::*;
