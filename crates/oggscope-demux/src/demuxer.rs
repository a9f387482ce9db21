//! The demuxer handle: opening, page dispatch and packet delivery.

use std::fs::File;
use std::path::Path;
use std::time::Duration;

use crate::codec::CodecRegistry;
use crate::config::DemuxConfig;
use crate::page;
use crate::snapshot::Snapshot;
use crate::source::{ByteSource, ReaderSource};
use crate::stream::{LogicalStream, StreamPhase};
use crate::timestamp;
use crate::types::{Packet, PacketFlags, StreamInfo};
use crate::{DemuxError, Result};

/// Ogg demultiplexer over a [`ByteSource`].
///
/// Opening reads pages until every stream has passed its header packets.
/// After that, [`OggDemuxer::next_packet`] yields data packets in file order
/// across all streams.
pub struct OggDemuxer<S> {
    pub(crate) source: S,
    pub(crate) config: DemuxConfig,
    pub(crate) registry: CodecRegistry,
    pub(crate) streams: Vec<LogicalStream>,
    pub(crate) tracks: Vec<StreamInfo>,
    /// Stream whose current page still has segments to walk.
    pub(crate) current: Option<usize>,
    pub(crate) headers_done: bool,
    /// Offset of the first page carrying data packets.
    pub(crate) data_offset: Option<u64>,
    pub(crate) snapshots: Vec<Snapshot>,
}

impl OggDemuxer<ReaderSource<File>> {
    /// Open a file with the default codec registry.
    pub fn open_path(path: impl AsRef<Path>, config: DemuxConfig) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        Self::open(ReaderSource::new(file)?, CodecRegistry::with_defaults(), config)
    }
}

impl<S: ByteSource> OggDemuxer<S> {
    /// Read the header packets of every stream found at the start of `source`.
    pub fn open(source: S, registry: CodecRegistry, config: DemuxConfig) -> Result<Self> {
        let mut demuxer = Self {
            source,
            config,
            registry,
            streams: Vec::new(),
            tracks: Vec::new(),
            current: None,
            headers_done: false,
            data_offset: None,
            snapshots: Vec::new(),
        };

        demuxer.read_headers()?;
        demuxer.check_header_counts()?;

        if demuxer.config.probe_duration && demuxer.source.is_seekable() {
            if let Err(e) = demuxer.probe_duration() {
                tracing::warn!(error = %e, "duration probe failed");
            }
        }

        tracing::debug!(
            streams = demuxer.streams.len(),
            data_offset = ?demuxer.data_offset,
            "opened ogg source"
        );
        Ok(demuxer)
    }

    fn read_headers(&mut self) -> Result<()> {
        while !self.headers_done {
            match self.assemble() {
                Ok(_) => {}
                Err(e) if e.is_eof() => {
                    if !self.streams.iter().any(|s| s.codec.is_some()) {
                        return Err(DemuxError::NoStreams);
                    }
                    tracing::debug!(error = %e, "source ended during header phase");
                    self.headers_done = true;
                    self.data_offset = Some(self.source.tell());
                }
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    fn check_header_counts(&self) -> Result<()> {
        for (index, stream) in self.streams.iter().enumerate() {
            let Some(codec) = &stream.codec else {
                continue;
            };
            let expected = codec.handler.expected_header_count();
            if stream.phase != StreamPhase::InData || stream.header_count >= expected {
                continue;
            }
            if self.config.strict_header_count {
                return Err(DemuxError::HeaderCountMismatch {
                    stream: index,
                    expected,
                    received: stream.header_count,
                });
            }
            tracing::warn!(
                stream = index,
                codec = codec.name(),
                expected,
                received = stream.header_count,
                "stream is missing header packets"
            );
        }
        Ok(())
    }

    /// Streams discovered so far, indexed by [`Packet::stream_index`].
    pub fn streams(&self) -> &[StreamInfo] {
        &self.tracks
    }

    pub fn stream(&self, index: usize) -> Option<&StreamInfo> {
        self.tracks.get(index)
    }

    /// Lifecycle phase of a stream.
    pub fn stream_phase(&self, index: usize) -> Option<StreamPhase> {
        self.streams.get(index).map(|s| s.phase)
    }

    /// Longest stream duration, if any was probed.
    pub fn duration(&self) -> Option<Duration> {
        self.tracks.iter().filter_map(StreamInfo::duration_time).max()
    }

    /// Offset of the first data page, known once the header phase is over.
    pub fn data_offset(&self) -> Option<u64> {
        self.data_offset
    }

    pub fn config(&self) -> &DemuxConfig {
        &self.config
    }

    /// Current read position of the underlying source.
    pub fn position(&self) -> u64 {
        self.source.tell()
    }

    /// Next data packet, or `None` at the end of the source.
    pub fn next_packet(&mut self) -> Result<Option<Packet>> {
        loop {
            let raw = match self.assemble() {
                Ok(Some(raw)) => raw,
                Ok(None) => continue,
                Err(e) if e.is_eof() => {
                    tracing::trace!(error = %e, "end of packets");
                    return Ok(None);
                }
                Err(e) => return Err(e),
            };

            let stream = &mut self.streams[raw.stream];
            let (pts, dts) = timestamp::translate(stream);

            if stream.keyframe_seek {
                if !raw.meta.keyframe {
                    continue;
                }
                stream.keyframe_seek = false;
            }

            return Ok(Some(Packet {
                stream_index: raw.stream,
                data: raw.data,
                pts,
                dts,
                flags: PacketFlags {
                    keyframe: raw.meta.keyframe,
                    corrupt: raw.corrupt,
                },
                duration: raw.meta.duration,
                end_trim: raw.meta.end_trim,
                pos: raw.pos,
            }));
        }
    }

    /// Release codec state and hand back the source.
    pub fn close(mut self) -> S {
        for stream in &mut self.streams {
            if let Some(codec) = stream.codec.as_mut() {
                codec.state.cleanup();
            }
        }
        self.source
    }

    /// Read the next page and append its payload to the owning stream.
    pub(crate) fn read_page(&mut self) -> Result<usize> {
        let header = page::read_page_header(&mut self.source, self.config.sync_window)?;

        let index = match self.streams.iter().position(|s| s.serial == header.serial) {
            Some(index) => index,
            None if self.streams.iter().any(|s| s.got_data) => self.replace_stream(header.serial)?,
            None => self.add_stream(header.serial),
        };

        let stream = &mut self.streams[index];
        stream.compact();

        let size = header.payload_size();
        stream.reserve_payload(size, self.config.max_buffer_size)?;
        let start = stream.buf.len();
        stream.buf.resize(start + size, 0);
        let read = match self.source.read_full(&mut stream.buf[start..]) {
            Ok(n) => n,
            Err(e) => {
                stream.buf.truncate(start);
                return Err(e.into());
            }
        };
        if read < size {
            stream.buf.truncate(start);
            return Err(DemuxError::truncated(header.offset, "page payload"));
        }

        stream.accept_page(&header);
        tracing::trace!(
            offset = header.offset,
            serial = header.serial,
            sequence = header.sequence,
            segments = header.segments.len(),
            granule = ?header.granule,
            "page"
        );
        Ok(index)
    }

    fn add_stream(&mut self, serial: u32) -> usize {
        let index = self.streams.len();
        self.streams.push(LogicalStream::new(serial));
        self.tracks.push(StreamInfo::new(index, serial));
        tracing::debug!(serial, index, "new logical stream");
        index
    }

    /// A new serial after data pages starts the next chained segment.
    fn replace_stream(&mut self, serial: u32) -> Result<usize> {
        if self.streams.len() != 1 {
            return Err(DemuxError::MultistreamReplaceUnsupported {
                serial,
                active: self.streams.len(),
            });
        }

        let old = self.streams[0].serial;
        self.streams[0].replace(serial);
        self.tracks[0] = StreamInfo::new(0, serial);
        tracing::info!(old_serial = old, serial, "replacing chained stream");
        Ok(0)
    }
}

impl<S> std::fmt::Debug for OggDemuxer<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OggDemuxer")
            .field("streams", &self.tracks)
            .field("registry", &self.registry)
            .field("current", &self.current)
            .field("headers_done", &self.headers_done)
            .field("data_offset", &self.data_offset)
            .finish_non_exhaustive()
    }
}
