//! Packet reassembly and the per-stream header/data state machine.

use bytes::Bytes;

use crate::codec::{BoundCodec, HeaderOutcome, PacketMeta};
use crate::config::HeaderErrorPolicy;
use crate::demuxer::OggDemuxer;
use crate::source::ByteSource;
use crate::stream::StreamPhase;
use crate::{DemuxError, Result};

/// A completed data packet before timestamp translation.
#[derive(Debug)]
pub(crate) struct RawPacket {
    pub stream: usize,
    pub data: Bytes,
    pub pos: u64,
    pub meta: PacketMeta,
    pub corrupt: bool,
}

impl<S: ByteSource> OggDemuxer<S> {
    /// Complete at most one packet, reading pages as needed.
    ///
    /// `Ok(None)` means the step produced nothing for the caller: a header
    /// was consumed, an unknown stream's page was dropped, or the header
    /// phase just ended and the packet will be offered again.
    pub(crate) fn assemble(&mut self) -> Result<Option<RawPacket>> {
        let (index, segp, psize) = loop {
            let index = match self.current {
                Some(index) => index,
                None => self.read_page()?,
            };

            let stream = &mut self.streams[index];
            if stream.phase == StreamPhase::Unrecognized {
                stream.discard_page();
                self.current = None;
                return Ok(None);
            }

            let (segp, psize) = (stream.segp, stream.psize);
            if stream.next_packet_boundary() {
                break (index, segp, psize);
            }
            self.current = None;
        };

        self.current = Some(index);
        let stream = &mut self.streams[index];
        stream.incomplete = false;
        if stream.granule.is_none() {
            tracing::debug!(
                serial = stream.serial,
                offset = stream.page_pos,
                "page is missing granule"
            );
        }

        if stream.phase == StreamPhase::Unidentified && !self.identify(index) {
            return Ok(None);
        }

        let stream = &mut self.streams[index];
        if stream.phase == StreamPhase::InHeader {
            let outcome = match stream.codec.as_mut() {
                Some(codec) => codec.state.header(
                    &stream.buf[stream.pstart..stream.pstart + stream.psize],
                    &mut self.tracks[index],
                ),
                None => HeaderOutcome::NotHeader,
            };

            match outcome {
                HeaderOutcome::IsHeader => {
                    stream.header_count += 1;
                    self.tracks[index]
                        .header_packets
                        .push(Bytes::copy_from_slice(stream.packet()));
                    stream.consume_packet();
                    self.finish_step(index);
                    return Ok(None);
                }
                HeaderOutcome::NotHeader => {}
                HeaderOutcome::Malformed(reason) => match self.config.header_errors {
                    HeaderErrorPolicy::Fatal => {
                        tracing::error!(serial = stream.serial, %reason, "malformed header packet");
                        return Err(DemuxError::header(stream.serial, reason));
                    }
                    HeaderErrorPolicy::FallThrough => {
                        tracing::warn!(
                            serial = stream.serial,
                            %reason,
                            "malformed header packet, treating as data"
                        );
                    }
                },
            }
            stream.phase = StreamPhase::InData;
            tracing::debug!(
                serial = stream.serial,
                headers = stream.header_count,
                "stream entered data phase"
            );
        }

        if !self.headers_done {
            // Leave the packet in place for the first call after open.
            let stream = &mut self.streams[index];
            stream.segp = segp;
            stream.psize = psize;
            self.finish_header_phase(index);
            return Ok(None);
        }

        let stream = &mut self.streams[index];
        stream.update_page_end();
        let mut meta = PacketMeta {
            page_flags: stream.page_flags,
            granule: if stream.page_end { stream.granule } else { None },
            ..PacketMeta::default()
        };
        if let Some(codec) = stream.codec.as_mut() {
            codec
                .state
                .packet(&stream.buf[stream.pstart..stream.pstart + stream.psize], &mut meta);
        }

        let data = Bytes::copy_from_slice(stream.packet());
        let pos = stream.sync_pos.unwrap_or(stream.page_pos);
        let corrupt = std::mem::take(&mut stream.lost_pages);
        stream.consume_packet();
        stream.sync_pos = Some(stream.page_pos);
        self.finish_step(index);

        Ok(Some(RawPacket {
            stream: index,
            data,
            pos,
            meta,
            corrupt,
        }))
    }

    /// Bind a codec to the stream from its first complete packet.
    ///
    /// Returns `false` when no handler matched and the stream was marked
    /// unrecognized.
    fn identify(&mut self, index: usize) -> bool {
        let stream = &mut self.streams[index];
        let Some(handler) = self.registry.find(stream.packet()) else {
            let err = DemuxError::UnrecognizedCodec {
                serial: stream.serial,
            };
            tracing::warn!(error = %err, "ignoring stream");
            stream.phase = StreamPhase::Unrecognized;
            stream.discard_page();
            self.current = None;
            return false;
        };

        let codec = BoundCodec::new(handler);
        let expected = codec.handler.expected_header_count();
        tracing::debug!(
            serial = stream.serial,
            codec = codec.name(),
            expected_headers = expected,
            "identified stream"
        );
        self.tracks[index].codec = Some(codec.name());
        stream.codec = Some(codec);
        stream.phase = if expected == 0 {
            StreamPhase::InData
        } else {
            StreamPhase::InHeader
        };
        true
    }

    /// Update the page-end flag and release the page once it is walked.
    fn finish_step(&mut self, index: usize) {
        let stream = &mut self.streams[index];
        stream.update_page_end();
        if stream.page_exhausted() {
            self.current = None;
        }
    }

    /// The first data packet of any stream ends the header phase.
    fn finish_header_phase(&mut self, index: usize) {
        self.headers_done = true;

        let stream = &self.streams[index];
        let mut offset = stream.sync_pos.unwrap_or(stream.page_pos);
        for other in self.streams.iter().filter(|s| s.incomplete) {
            if let Some(pos) = other.sync_pos {
                offset = offset.min(pos);
            }
        }

        self.data_offset = Some(offset);
        tracing::debug!(data_offset = offset, "header phase complete");
    }
}
