//! Shared helpers for integration tests.
//!
//! [`StreamWriter`] synthesises Ogg pages in memory and [`TestHandler`] is a
//! tiny codec whose headers and keyframes are easy to spell out in a test.

#![allow(dead_code)]

use std::io::Cursor;

use oggscope_demux::page::lacing_values;
use oggscope_demux::{
    CodecHandler, CodecRegistry, CodecState, DemuxConfig, HeaderOutcome, MediaType, OggDemuxer,
    PacketMeta, PageFlags, ReaderSource, StreamInfo, TimeBase,
};

pub const AUDIO_MAGIC: &[u8] = b"TAUD";
pub const VIDEO_MAGIC: &[u8] = b"TVID";
pub const START_MAGIC: &[u8] = b"TSTA";

pub const BOS: u8 = PageFlags::BOS;
pub const CONT: u8 = PageFlags::CONTINUATION;
pub const EOS: u8 = PageFlags::EOS;

/// Encode one page.
pub fn page(
    serial: u32,
    sequence: u32,
    flags: u8,
    granule: Option<u64>,
    segments: &[u8],
    payload: &[u8],
) -> Vec<u8> {
    assert!(segments.len() <= 255);
    assert_eq!(
        segments.iter().map(|&s| s as usize).sum::<usize>(),
        payload.len()
    );

    let mut out = b"OggS".to_vec();
    out.push(0);
    out.push(flags);
    out.extend_from_slice(&granule.unwrap_or(u64::MAX).to_le_bytes());
    out.extend_from_slice(&serial.to_le_bytes());
    out.extend_from_slice(&sequence.to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes());
    out.push(segments.len() as u8);
    out.extend_from_slice(segments);
    out.extend_from_slice(payload);
    out
}

/// Pages for one logical stream with running sequence numbers.
pub struct StreamWriter {
    pub serial: u32,
    pub sequence: u32,
}

impl StreamWriter {
    pub fn new(serial: u32) -> Self {
        Self {
            serial,
            sequence: 0,
        }
    }

    /// A page holding whole packets.
    pub fn packets(&mut self, flags: u8, granule: Option<u64>, packets: &[&[u8]]) -> Vec<u8> {
        let mut segments = Vec::new();
        let mut payload = Vec::new();
        for packet in packets {
            segments.extend(lacing_values(packet.len()));
            payload.extend_from_slice(packet);
        }
        self.raw(flags, granule, &segments, &payload)
    }

    /// A page with an explicit segment table.
    pub fn raw(&mut self, flags: u8, granule: Option<u64>, segments: &[u8], payload: &[u8]) -> Vec<u8> {
        let out = page(self.serial, self.sequence, flags, granule, segments, payload);
        self.sequence += 1;
        out
    }

    /// One packet spread over as many pages as its lacing needs.
    pub fn spanning(&mut self, packet: &[u8], granule: Option<u64>) -> Vec<u8> {
        let lacing = lacing_values(packet.len());
        let chunks: Vec<&[u8]> = lacing.chunks(255).collect();
        let mut out = Vec::new();
        let mut offset = 0;
        for (i, chunk) in chunks.iter().enumerate() {
            let size: usize = chunk.iter().map(|&s| s as usize).sum();
            let flags = if i == 0 { 0 } else { CONT };
            let last = i + 1 == chunks.len();
            out.extend(self.raw(
                flags,
                if last { granule } else { None },
                chunk,
                &packet[offset..offset + size],
            ));
            offset += size;
        }
        out
    }

    /// BOS identification page and a second header page.
    pub fn headers(&mut self, magic: &[u8]) -> Vec<u8> {
        let mut id = magic.to_vec();
        id.extend_from_slice(&[1, 0, 0, 0]);
        let mut out = self.packets(BOS, Some(0), &[&id]);
        out.extend(self.packets(0, Some(0), &[b"HDR comment"]));
        out
    }
}

/// Data packet whose first byte marks a keyframe (`K`) and which carries
/// its sequence number.
pub fn frame(index: u32, keyframe: bool, len: usize) -> Vec<u8> {
    let mut p = vec![if keyframe { b'K' } else { b'P' }];
    p.extend_from_slice(&index.to_le_bytes());
    while p.len() < len {
        p.push((p.len() as u8).wrapping_mul(31));
    }
    p
}

/// Index written by [`frame`].
pub fn frame_index(data: &[u8]) -> u32 {
    u32::from_le_bytes([data[1], data[2], data[3], data[4]])
}

/// Test codec: an identification packet starting with the magic, then
/// packets starting with `HDR` are headers and `BAD` is a broken header.
pub struct TestHandler {
    pub name: &'static str,
    pub magic: &'static [u8],
    pub video: bool,
    pub granule_is_start: bool,
}

impl TestHandler {
    pub fn audio() -> Self {
        Self {
            name: "test-audio",
            magic: AUDIO_MAGIC,
            video: false,
            granule_is_start: false,
        }
    }

    pub fn video() -> Self {
        Self {
            name: "test-video",
            magic: VIDEO_MAGIC,
            video: true,
            granule_is_start: false,
        }
    }

    pub fn start_granule() -> Self {
        Self {
            name: "test-start",
            magic: START_MAGIC,
            video: false,
            granule_is_start: true,
        }
    }
}

impl CodecHandler for TestHandler {
    fn name(&self) -> &'static str {
        self.name
    }

    fn magic(&self) -> &'static [u8] {
        self.magic
    }

    fn expected_header_count(&self) -> u32 {
        2
    }

    fn granule_is_start(&self) -> bool {
        self.granule_is_start
    }

    fn new_state(&self) -> Box<dyn CodecState> {
        Box::new(TestState {
            name: self.name,
            magic: self.magic,
            video: self.video,
        })
    }
}

#[derive(Debug, Clone)]
pub struct TestState {
    name: &'static str,
    magic: &'static [u8],
    video: bool,
}

impl CodecState for TestState {
    fn header(&mut self, packet: &[u8], info: &mut StreamInfo) -> HeaderOutcome {
        if packet.starts_with(self.magic) {
            info.codec = Some(self.name);
            info.media_type = if self.video {
                MediaType::Video
            } else {
                MediaType::Audio
            };
            info.time_base = TimeBase::new(1, 1000);
            return HeaderOutcome::IsHeader;
        }
        if packet.starts_with(b"HDR") {
            return HeaderOutcome::IsHeader;
        }
        if packet.starts_with(b"BAD") {
            return HeaderOutcome::Malformed("broken test header".into());
        }
        HeaderOutcome::NotHeader
    }

    fn packet(&mut self, packet: &[u8], meta: &mut PacketMeta) {
        meta.keyframe = !self.video || packet.first() == Some(&b'K');
        meta.duration = Some(1);
    }

    fn box_clone(&self) -> Box<dyn CodecState> {
        Box::new(self.clone())
    }
}

pub fn registry() -> CodecRegistry {
    CodecRegistry::new()
        .with(TestHandler::audio())
        .with(TestHandler::video())
        .with(TestHandler::start_granule())
}

pub fn no_probe() -> DemuxConfig {
    DemuxConfig {
        probe_duration: false,
        ..DemuxConfig::default()
    }
}

pub type MemDemuxer = OggDemuxer<ReaderSource<Cursor<Vec<u8>>>>;

pub fn open(bytes: Vec<u8>, config: DemuxConfig) -> oggscope_demux::Result<MemDemuxer> {
    let source = ReaderSource::new(Cursor::new(bytes))?;
    OggDemuxer::open(source, registry(), config)
}

/// Audio stream: headers, then `pages` pages of one packet each with
/// granule `(k + 1) * 100`.
pub fn audio_file(serial: u32, pages: u32) -> Vec<u8> {
    let mut w = StreamWriter::new(serial);
    let mut out = w.headers(AUDIO_MAGIC);
    for k in 0..pages {
        let flags = if k + 1 == pages { EOS } else { 0 };
        out.extend(w.packets(flags, Some((k as u64 + 1) * 100), &[&frame(k, true, 40)]));
    }
    out
}

/// Video stream: one frame per page, keyframe every `gop` frames, page `k`
/// carries granule `k + 1`.
pub fn video_file(serial: u32, frames: u32, gop: u32) -> Vec<u8> {
    let mut w = StreamWriter::new(serial);
    let mut out = w.headers(VIDEO_MAGIC);
    for k in 0..frames {
        let flags = if k + 1 == frames { EOS } else { 0 };
        out.extend(w.packets(flags, Some(k as u64 + 1), &[&frame(k, k % gop == 0, 60)]));
    }
    out
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("oggscope_demux=debug")
        .with_test_writer()
        .try_init();
}
