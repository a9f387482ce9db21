//! Stream duration from the last granule position in the file.
//!
//! The tail of the file is scanned for the final granule of every stream.
//! Streams without a known start time are then read forward from the first
//! data page until their first timestamp shows up, and that is subtracted.
//! Both scans run inside snapshots, so the read position and stream state
//! are the same afterwards as before.

use crate::demuxer::OggDemuxer;
use crate::page::MAX_PAGE_SIZE;
use crate::snapshot::RestoreMode;
use crate::source::ByteSource;
use crate::timestamp;
use crate::Result;

impl<S: ByteSource> OggDemuxer<S> {
    /// Fill in [`StreamInfo::duration`](crate::StreamInfo::duration) for every
    /// stream that has a granule near the end of the source.
    ///
    /// Does nothing on non-seekable sources or when every identified stream
    /// already has a duration.
    pub fn probe_duration(&mut self) -> Result<()> {
        let Some(size) = self.source.size() else {
            return Ok(());
        };
        let identified = self.streams.iter().filter(|s| s.codec.is_some()).count();
        let known = self
            .tracks
            .iter()
            .zip(&self.streams)
            .filter(|(t, s)| s.codec.is_some() && t.duration.is_some())
            .count();
        if identified == 0 || known == identified {
            return Ok(());
        }

        let tail_start = size.saturating_sub(MAX_PAGE_SIZE as u64);
        self.save_state();
        let last = self.scan_tail(tail_start);
        self.restore_state(RestoreMode::Rewind)?;

        let mut durations = last.clone();
        let mut pending = vec![false; last.len()];
        for (index, &end) in last.iter().enumerate() {
            let Some(end) = end else { continue };
            match self.tracks[index].start_time {
                Some(start) => durations[index] = Some(end - start),
                None => pending[index] = true,
            }
        }

        let first = if pending.iter().any(|&p| p) {
            self.save_state();
            let first = self.scan_head(&pending);
            self.restore_state(RestoreMode::Rewind)?;
            first?
        } else {
            vec![None; last.len()]
        };

        for (index, duration) in durations.iter_mut().enumerate() {
            if let (Some(end), Some(start)) = (last[index], first[index]) {
                *duration = Some(end - start);
                self.tracks[index].start_time = Some(start);
            }
            if let Some(d) = duration {
                tracing::debug!(stream = index, duration = *d, "probed duration");
                self.tracks[index].duration = Some(*d);
            }
        }
        Ok(())
    }

    /// Last non-zero granule, as a timestamp, of every stream seen from `start`.
    fn scan_tail(&mut self, start: u64) -> Vec<Option<i64>> {
        let count = self.streams.len();
        let mut last = vec![None; count];

        if let Err(e) = self.source.seek(start) {
            tracing::debug!(error = %e, "cannot seek to file tail");
            return last;
        }
        self.reset();

        loop {
            let index = match self.read_page() {
                Ok(index) => index,
                Err(e) => {
                    tracing::trace!(error = %e, "tail scan stopped");
                    break;
                }
            };
            if index >= count {
                continue;
            }
            let stream = &self.streams[index];
            if let (Some(granule), Some(codec)) = (stream.granule, &stream.codec) {
                if granule != 0 {
                    if let Some(ts) = codec.state.granule_to_ts(granule).0 {
                        last[index] = Some(ts);
                    }
                }
            }
        }
        last
    }

    /// First timestamp of every `wanted` stream, reading from the first data page.
    fn scan_head(&mut self, wanted: &[bool]) -> Result<Vec<Option<i64>>> {
        let mut first = vec![None; wanted.len()];
        let mut left = wanted.iter().filter(|&&w| w).count();

        self.source.seek(self.data_offset.unwrap_or(0))?;
        self.reset();

        while left > 0 {
            let raw = match self.assemble() {
                Ok(Some(raw)) => raw,
                Ok(None) => continue,
                Err(e) => {
                    tracing::trace!(error = %e, "head scan stopped");
                    break;
                }
            };
            let (pts, _) = timestamp::translate(&mut self.streams[raw.stream]);
            if raw.stream >= wanted.len() {
                continue;
            }
            if let (true, None, Some(pts)) = (wanted[raw.stream], first[raw.stream], pts) {
                first[raw.stream] = Some(pts);
                left -= 1;
            }
        }
        Ok(first)
    }
}
