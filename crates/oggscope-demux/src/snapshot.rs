//! Saving and restoring the complete demuxer position.
//!
//! A snapshot holds the source offset, the active stream and a deep copy of
//! every stream, so a lookahead scan can run and then be undone exactly.

use crate::demuxer::OggDemuxer;
use crate::source::ByteSource;
use crate::stream::LogicalStream;
use crate::types::StreamInfo;
use crate::Result;

/// What [`OggDemuxer::restore_state`] does with the popped snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestoreMode {
    /// Return the source and every stream to the saved state.
    Rewind,
    /// Keep the current state and forget the snapshot.
    Discard,
}

#[derive(Debug, Clone)]
pub(crate) struct Snapshot {
    pos: u64,
    current: Option<usize>,
    streams: Vec<LogicalStream>,
    tracks: Vec<StreamInfo>,
}

impl<S: ByteSource> OggDemuxer<S> {
    /// Push the current position and stream state.
    pub fn save_state(&mut self) {
        self.snapshots.push(Snapshot {
            pos: self.source.tell(),
            current: self.current,
            streams: self.streams.clone(),
            tracks: self.tracks.clone(),
        });
        tracing::trace!(depth = self.snapshots.len(), "saved demuxer state");
    }

    /// Pop the most recent snapshot. Does nothing when none is saved.
    ///
    /// With [`RestoreMode::Rewind`], streams discovered since the save are
    /// dropped and the source is moved back. Stream descriptors keep what
    /// was learned meanwhile unless their stream was replaced.
    pub fn restore_state(&mut self, mode: RestoreMode) -> Result<()> {
        let Some(snapshot) = self.snapshots.pop() else {
            return Ok(());
        };
        if mode == RestoreMode::Discard {
            return Ok(());
        }

        for stream in self.streams.iter_mut().skip(snapshot.streams.len()) {
            if let Some(codec) = stream.codec.as_mut() {
                codec.state.cleanup();
            }
        }

        self.source.seek(snapshot.pos)?;
        self.tracks.truncate(snapshot.tracks.len());
        for (live, saved) in self.tracks.iter_mut().zip(snapshot.tracks) {
            if live.serial != saved.serial {
                *live = saved;
            }
        }
        self.current = snapshot.current;
        self.streams = snapshot.streams;
        tracing::trace!(pos = snapshot.pos, "restored demuxer state");
        Ok(())
    }

    /// Number of saved snapshots.
    pub fn saved_states(&self) -> usize {
        self.snapshots.len()
    }
}
