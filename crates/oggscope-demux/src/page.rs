//! Page framing: marker sync, fixed header and segment table.
//!
//! ```text
//! capture pattern  4 bytes  "OggS"
//! version          1 byte   always 0
//! header type      1 byte   continuation=0x01, BOS=0x02, EOS=0x04
//! granule position 8 bytes  little-endian, all-ones = unset
//! serial number    4 bytes
//! sequence number  4 bytes
//! checksum         4 bytes  not verified
//! segment count    1 byte
//! segment table    N bytes
//! payload          sum(segment table) bytes
//! ```

use crate::source::ByteSource;
use crate::{DemuxError, Result};

/// Page capture pattern.
pub const PAGE_MAGIC: [u8; 4] = *b"OggS";

/// Size of the fixed part of a page header, including the segment count.
pub const PAGE_HEADER_SIZE: usize = 27;

/// Largest possible page: header, 255 lacing values, 255 full segments.
pub const MAX_PAGE_SIZE: usize = PAGE_HEADER_SIZE + 255 + 255 * 255;

/// Granule position meaning "no packet ends on this page".
pub const GRANULE_UNSET: u64 = u64::MAX;

/// Header type flags of a page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageFlags(u8);

impl PageFlags {
    pub const CONTINUATION: u8 = 0x01;
    pub const BOS: u8 = 0x02;
    pub const EOS: u8 = 0x04;

    pub fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    pub fn bits(self) -> u8 {
        self.0
    }

    /// First segment continues a packet from an earlier page.
    pub fn is_continuation(self) -> bool {
        self.0 & Self::CONTINUATION != 0
    }

    /// First page of a logical stream.
    pub fn is_bos(self) -> bool {
        self.0 & Self::BOS != 0
    }

    /// Last page of a logical stream.
    pub fn is_eos(self) -> bool {
        self.0 & Self::EOS != 0
    }
}

/// Parsed page header. The payload stays in the source until dispatched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageHeader {
    /// File offset of the capture pattern.
    pub offset: u64,
    pub flags: PageFlags,
    /// Granule position, `None` when unset.
    pub granule: Option<u64>,
    pub serial: u32,
    pub sequence: u32,
    pub checksum: u32,
    /// Lacing values.
    pub segments: Vec<u8>,
}

impl PageHeader {
    /// Payload length announced by the segment table.
    pub fn payload_size(&self) -> usize {
        self.segments.iter().map(|&s| s as usize).sum()
    }

    /// Header plus payload length.
    pub fn total_size(&self) -> usize {
        PAGE_HEADER_SIZE + self.segments.len() + self.payload_size()
    }
}

/// Scan forward for the capture pattern, leaving the source just past it.
///
/// Returns the offset of the pattern. At most `window` bytes beyond the first
/// four are examined.
pub fn sync<S: ByteSource + ?Sized>(source: &mut S, window: usize) -> Result<u64> {
    let start = source.tell();
    let mut ring = [0u8; 4];
    if source.read_full(&mut ring)? < 4 {
        return Err(DemuxError::Eof);
    }

    let mut head = 0usize;
    for _ in 0..=window {
        if (0..4).all(|i| ring[(head + i) & 3] == PAGE_MAGIC[i]) {
            return Ok(source.tell() - 4);
        }
        match source.read_u8()? {
            Some(byte) => {
                ring[head & 3] = byte;
                head += 1;
            }
            None => return Err(DemuxError::Eof),
        }
    }

    tracing::info!(offset = start, window, "cannot find page marker");
    Err(DemuxError::SyncNotFound {
        offset: start,
        window,
    })
}

/// Sync to the next page and parse its header and segment table.
pub fn read_page_header<S: ByteSource + ?Sized>(
    source: &mut S,
    window: usize,
) -> Result<PageHeader> {
    let offset = sync(source, window)?;

    let mut fixed = [0u8; PAGE_HEADER_SIZE - 4];
    if source.read_full(&mut fixed)? < fixed.len() {
        return Err(DemuxError::truncated(offset, "page header"));
    }

    let version = fixed[0];
    if version != 0 {
        tracing::error!(offset, version, "unsupported page version");
        return Err(DemuxError::UnsupportedVersion { offset, version });
    }

    let flags = PageFlags::from_bits(fixed[1]);
    let granule = u64::from_le_bytes([
        fixed[2], fixed[3], fixed[4], fixed[5], fixed[6], fixed[7], fixed[8], fixed[9],
    ]);
    let serial = u32::from_le_bytes([fixed[10], fixed[11], fixed[12], fixed[13]]);
    let sequence = u32::from_le_bytes([fixed[14], fixed[15], fixed[16], fixed[17]]);
    let checksum = u32::from_le_bytes([fixed[18], fixed[19], fixed[20], fixed[21]]);
    let nsegs = fixed[22] as usize;

    let mut segments = vec![0u8; nsegs];
    if source.read_full(&mut segments)? < nsegs {
        return Err(DemuxError::truncated(offset, "segment table"));
    }

    Ok(PageHeader {
        offset,
        flags,
        granule: (granule != GRANULE_UNSET).then_some(granule),
        serial,
        sequence,
        checksum,
        segments,
    })
}

/// Lacing values for a packet of `len` bytes.
///
/// One 255 per full 255-byte run, then the remainder, which is an explicit 0
/// when `len` is a multiple of 255.
pub fn lacing_values(len: usize) -> Vec<u8> {
    let mut values = vec![255u8; len / 255];
    values.push((len % 255) as u8);
    values
}
