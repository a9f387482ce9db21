//! Repositioning: state reset, timestamp reads and keyframe-aware seeking.

use crate::demuxer::OggDemuxer;
use crate::search::{self, TimestampSource};
use crate::source::ByteSource;
use crate::timestamp;
use crate::types::{MediaType, SeekFlags};
use crate::{DemuxError, Result};

impl<S: ByteSource> OggDemuxer<S> {
    /// Forget everything tied to the previous read position.
    ///
    /// Codec bindings and header progress survive. When the source sits at
    /// or before the first data page, the next timestamp is seeded with 0.
    pub(crate) fn reset(&mut self) {
        let pos = self.source.tell();
        let at_start = self.data_offset.map_or(true, |start| pos <= start);
        for stream in &mut self.streams {
            stream.reset(at_start);
        }
        self.current = None;
    }

    /// First timestamp of `stream` at or after `*pos`, not reading past `limit`.
    ///
    /// `*pos` is updated to the offset of the packet the timestamp belongs
    /// to. During a keyframe seek, non-keyframes report the last keyframe
    /// offset, or no timestamp when none has been seen yet. The demuxer is
    /// reset afterwards, so the read position is unspecified.
    pub fn read_timestamp(
        &mut self,
        stream: usize,
        pos: &mut u64,
        limit: u64,
    ) -> Result<Option<i64>> {
        if stream >= self.streams.len() {
            return Err(DemuxError::InvalidStream(stream));
        }

        self.source.seek(*pos)?;
        self.reset();

        let mut keypos = None;
        let mut pts = None;
        while self.source.tell() <= limit {
            let raw = match self.assemble() {
                Ok(Some(raw)) => raw,
                Ok(None) => continue,
                Err(e) => {
                    tracing::trace!(error = %e, "timestamp read stopped");
                    break;
                }
            };

            *pos = raw.pos;
            if raw.stream == stream {
                pts = timestamp::translate(&mut self.streams[stream]).0;
                if raw.meta.keyframe {
                    keypos = Some(raw.pos);
                } else if self.streams[stream].keyframe_seek {
                    match keypos {
                        Some(k) => *pos = k,
                        None => pts = None,
                    }
                }
            }
            if pts.is_some() {
                break;
            }
        }

        self.reset();
        Ok(pts)
    }

    /// Move to the packet of `stream` nearest `target` (in the stream's time base).
    ///
    /// On video streams, unless `flags.any` is set, packets are dropped after
    /// the seek until the first keyframe of that stream.
    pub fn seek(&mut self, stream: usize, target: i64, flags: SeekFlags) -> Result<()> {
        if stream >= self.streams.len() {
            return Err(DemuxError::InvalidStream(stream));
        }
        if !self.source.is_seekable() {
            return Err(DemuxError::NotSeekable);
        }

        let origin = self.source.tell();
        self.reset();
        let keyframes_only =
            self.tracks[stream].media_type == MediaType::Video && !flags.any;
        if keyframes_only {
            self.streams[stream].keyframe_seek = true;
        }

        let found = search::search_timestamp(self, stream, target, flags.backward);
        let failure = match found {
            Ok(Some((pos, ts))) => {
                self.source.seek(pos)?;
                self.reset();
                tracing::debug!(stream, target, pos, ts, keyframes_only, "seek");
                return Ok(());
            }
            Ok(None) => DemuxError::SeekFailed { stream, target },
            Err(e) => e,
        };

        tracing::warn!(stream, target, error = %failure, "seek failed");
        self.streams[stream].keyframe_seek = false;
        self.source.seek(origin)?;
        self.reset();
        Err(failure)
    }
}

impl<S: ByteSource> TimestampSource for OggDemuxer<S> {
    fn read_timestamp(&mut self, stream: usize, pos: &mut u64, limit: u64) -> Result<Option<i64>> {
        OggDemuxer::read_timestamp(self, stream, pos, limit)
    }

    fn data_offset(&self) -> u64 {
        self.data_offset.unwrap_or(0)
    }

    fn size(&self) -> Option<u64> {
        self.source.size()
    }
}
