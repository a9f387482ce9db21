//! Per-serial reassembly state.

use crate::codec::BoundCodec;
use crate::page::{PageFlags, PageHeader, MAX_PAGE_SIZE};
use crate::{DemuxError, Result};

/// Initial capacity of a stream buffer.
pub const INITIAL_BUFFER_SIZE: usize = MAX_PAGE_SIZE;

/// Where a logical stream is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamPhase {
    /// No packet assembled yet.
    Unidentified,
    /// A codec is bound and header packets are being consumed.
    InHeader,
    /// Packets are delivered to the caller.
    InData,
    /// No codec recognized the stream; its pages are dropped.
    Unrecognized,
}

/// State of one logical stream, keyed by serial number.
#[derive(Debug, Clone)]
pub(crate) struct LogicalStream {
    pub serial: u32,

    /// Page payloads; `buf[pstart..pstart + psize]` is the packet in progress.
    pub buf: Vec<u8>,
    pub pstart: usize,
    pub psize: usize,

    /// Lacing values of the current page and the next one to consume.
    pub segments: Vec<u8>,
    pub segp: usize,

    pub granule: Option<u64>,
    pub page_flags: PageFlags,
    pub pending_pts: Option<i64>,
    pub pending_dts: Option<i64>,

    /// Offset of the earliest page needed for the packet in progress.
    pub sync_pos: Option<u64>,
    /// Offset of the most recent page.
    pub page_pos: u64,

    /// The last page ended inside a packet.
    pub incomplete: bool,
    /// No further packet completes within the current page.
    pub page_end: bool,

    pub phase: StreamPhase,
    pub codec: Option<BoundCodec>,
    pub header_count: u32,

    pub keyframe_seek: bool,
    /// A page without the BOS flag has been seen.
    pub got_data: bool,

    pub last_sequence: Option<u32>,
    /// A sequence gap was seen while a packet was being continued.
    pub lost_pages: bool,
}

impl LogicalStream {
    pub fn new(serial: u32) -> Self {
        Self::with_buffer(serial, Vec::with_capacity(INITIAL_BUFFER_SIZE))
    }

    /// Fresh state for `serial` that reuses `buf`'s allocation.
    pub fn with_buffer(serial: u32, mut buf: Vec<u8>) -> Self {
        buf.clear();
        Self {
            serial,
            buf,
            pstart: 0,
            psize: 0,
            segments: Vec::new(),
            segp: 0,
            granule: None,
            page_flags: PageFlags::default(),
            pending_pts: None,
            pending_dts: None,
            sync_pos: None,
            page_pos: 0,
            incomplete: false,
            page_end: false,
            phase: StreamPhase::Unidentified,
            codec: None,
            header_count: 0,
            keyframe_seek: false,
            got_data: false,
            last_sequence: None,
            lost_pages: false,
        }
    }

    /// Hand the stream over to a new serial, keeping only the buffer allocation.
    pub fn replace(&mut self, serial: u32) {
        if let Some(codec) = self.codec.as_mut() {
            codec.state.cleanup();
        }
        let buf = std::mem::take(&mut self.buf);
        *self = Self::with_buffer(serial, buf);
    }

    /// Forget position-dependent state; the codec binding survives.
    pub fn reset(&mut self, seed_start: bool) {
        if let Some(codec) = self.codec.as_mut() {
            codec.state.reset(seed_start);
        }
        self.buf.clear();
        self.pstart = 0;
        self.psize = 0;
        self.segments.clear();
        self.segp = 0;
        self.granule = None;
        self.pending_pts = seed_start.then_some(0);
        self.pending_dts = None;
        self.sync_pos = None;
        self.page_pos = 0;
        self.incomplete = false;
        self.page_end = false;
        self.got_data = false;
        self.last_sequence = None;
        self.lost_pages = false;
    }

    /// The packet assembled so far.
    pub fn packet(&self) -> &[u8] {
        &self.buf[self.pstart..self.pstart + self.psize]
    }

    /// Drop bytes before the packet in progress.
    pub fn compact(&mut self) {
        if self.pstart > 0 {
            self.buf.drain(..self.pstart);
            self.pstart = 0;
        }
    }

    /// Make room for `size` more bytes, doubling the capacity as needed.
    pub fn reserve_payload(&mut self, size: usize, max: usize) -> Result<()> {
        let needed = self.buf.len() + size;
        let capacity = self.buf.capacity();
        if needed <= capacity {
            return Ok(());
        }

        let mut target = capacity.max(INITIAL_BUFFER_SIZE);
        while target < needed {
            target = target.saturating_mul(2);
        }
        if target > max {
            if needed > max {
                return Err(DemuxError::AllocationFailure { requested: needed });
            }
            target = max;
        }

        self.buf
            .try_reserve_exact(target - self.buf.len())
            .map_err(|_| DemuxError::AllocationFailure { requested: target })?;
        tracing::trace!(serial = self.serial, capacity = target, "grew stream buffer");
        Ok(())
    }

    /// Take over a page whose payload was just appended to `buf`.
    pub fn accept_page(&mut self, header: &PageHeader) {
        let payload_start = self.buf.len() - header.payload_size();

        self.page_pos = header.offset;
        self.segments.clear();
        self.segments.extend_from_slice(&header.segments);
        self.segp = 0;

        if !header.flags.is_bos() {
            self.got_data = true;
        }

        if header.flags.is_continuation() || self.incomplete {
            if self.psize == 0 {
                // Started in the middle of a packet: its head is lost, skip the tail.
                self.pstart = payload_start;
                while self.segp < self.segments.len() {
                    let seg = self.segments[self.segp];
                    self.segp += 1;
                    self.pstart += seg as usize;
                    if seg < 255 {
                        break;
                    }
                }
                self.sync_pos = Some(self.page_pos);
            } else if let Some(last) = self.last_sequence {
                if header.sequence != last.wrapping_add(1) {
                    tracing::warn!(
                        serial = self.serial,
                        expected = last.wrapping_add(1),
                        got = header.sequence,
                        "page sequence gap inside a packet"
                    );
                    self.lost_pages = true;
                }
            }
        } else {
            self.psize = 0;
            self.pstart = payload_start;
            self.sync_pos = Some(self.page_pos);
        }

        self.last_sequence = Some(header.sequence);
        self.granule = header.granule;
        self.page_flags = header.flags;
    }

    /// Walk the segment table until a packet completes.
    ///
    /// Returns `false` when the page runs out first; `incomplete` then records
    /// whether a partial packet is carried over.
    pub fn next_packet_boundary(&mut self) -> bool {
        while self.segp < self.segments.len() {
            let seg = self.segments[self.segp];
            self.segp += 1;
            self.psize += seg as usize;
            if seg < 255 {
                return true;
            }
        }
        self.incomplete = self.psize > 0;
        false
    }

    /// Mark the packet in progress as consumed.
    pub fn consume_packet(&mut self) {
        self.pstart += self.psize;
        self.psize = 0;
        if self.pstart == self.buf.len() {
            self.buf.clear();
            self.pstart = 0;
        }
    }

    /// Whether no remaining lacing value of the page terminates a packet.
    pub fn update_page_end(&mut self) {
        self.page_end = self.segments[self.segp..].iter().all(|&s| s == 255);
    }

    pub fn page_exhausted(&self) -> bool {
        self.segp >= self.segments.len()
    }

    /// Throw away everything buffered for this stream.
    pub fn discard_page(&mut self) {
        self.buf.clear();
        self.pstart = 0;
        self.psize = 0;
        self.segp = self.segments.len();
        self.incomplete = false;
    }
}
