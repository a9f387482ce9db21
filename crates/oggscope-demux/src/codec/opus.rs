//! Opus stream mapping (RFC 7845).
//!
//! `OpusHead` is the identification header and `OpusTags` the comment header.
//! Granule positions count 48 kHz samples; the decoder drops `pre_skip`
//! samples at the start. On the final page the granule may stop short of
//! the decoded length; the excess is reported as end trim.

use super::{CodecHandler, CodecState, HeaderOutcome, PacketMeta};
use crate::types::{MediaType, StreamInfo, TimeBase};

const OPUS_HEAD: &[u8] = b"OpusHead";
const OPUS_TAGS: &[u8] = b"OpusTags";
const OPUS_HEAD_LEN: usize = 19;

/// Handler for Opus streams.
pub struct OpusHandler;

impl CodecHandler for OpusHandler {
    fn name(&self) -> &'static str {
        "opus"
    }

    fn magic(&self) -> &'static [u8] {
        OPUS_HEAD
    }

    fn expected_header_count(&self) -> u32 {
        1
    }

    fn new_state(&self) -> Box<dyn CodecState> {
        Box::new(OpusState::default())
    }
}

#[derive(Debug, Clone)]
struct OpusState {
    head_seen: bool,
    /// Decoded samples up to the end of the last packet, when known.
    samples: Option<u64>,
}

impl Default for OpusState {
    fn default() -> Self {
        Self {
            head_seen: false,
            samples: Some(0),
        }
    }
}

impl CodecState for OpusState {
    fn header(&mut self, packet: &[u8], info: &mut StreamInfo) -> HeaderOutcome {
        if packet.starts_with(OPUS_HEAD) {
            if self.head_seen {
                return HeaderOutcome::Malformed("duplicate OpusHead".into());
            }
            if packet.len() < OPUS_HEAD_LEN {
                return HeaderOutcome::Malformed(format!("OpusHead is {} bytes", packet.len()));
            }
            let version = packet[8];
            if version >> 4 != 0 {
                return HeaderOutcome::Malformed(format!("unsupported version {}", version));
            }
            let channels = packet[9];
            if channels == 0 {
                return HeaderOutcome::Malformed("zero channels".into());
            }
            let pre_skip = u16::from_le_bytes([packet[10], packet[11]]);

            self.head_seen = true;
            info.media_type = MediaType::Audio;
            info.codec = Some("opus");
            info.sample_rate = Some(48000);
            info.channels = Some(channels as u16);
            info.time_base = TimeBase::new(1, 48000);
            info.initial_padding = Some(pre_skip as u32);
            return HeaderOutcome::IsHeader;
        }

        if !self.head_seen {
            return HeaderOutcome::Malformed("packet before OpusHead".into());
        }
        if packet.starts_with(OPUS_TAGS) {
            return HeaderOutcome::IsHeader;
        }
        HeaderOutcome::NotHeader
    }

    fn packet(&mut self, packet: &[u8], meta: &mut PacketMeta) {
        meta.keyframe = true;
        let duration = packet_duration(packet);
        meta.duration = duration.map(i64::from);

        let samples = self
            .samples
            .zip(duration)
            .and_then(|(total, d)| total.checked_add(u64::from(d)));

        self.samples = match meta.granule {
            Some(granule) => {
                if let (Some(total), Some(d)) = (samples, duration) {
                    if meta.page_flags.is_eos() && total > granule {
                        meta.end_trim = Some((total - granule).min(u64::from(d)) as i64);
                    }
                }
                Some(granule)
            }
            None => samples,
        };
    }

    fn reset(&mut self, at_start: bool) {
        self.samples = at_start.then_some(0);
    }

    fn box_clone(&self) -> Box<dyn CodecState> {
        Box::new(self.clone())
    }
}

/// Number of 48 kHz samples in an Opus packet, from its TOC byte.
pub fn packet_duration(packet: &[u8]) -> Option<u32> {
    let toc = *packet.first()?;
    let config = toc >> 3;

    let frame_size = if config < 12 {
        // SILK: 10, 20, 40, 60 ms
        [480, 960, 1920, 2880][(config & 3) as usize]
    } else if config < 16 {
        // Hybrid: 10, 20 ms
        [480, 960][(config & 1) as usize]
    } else {
        // CELT: 2.5, 5, 10, 20 ms
        [120, 240, 480, 960][(config & 3) as usize]
    };

    let frames = match toc & 3 {
        0 => 1,
        1 | 2 => 2,
        _ => (*packet.get(1)? & 0x3f) as u32,
    };

    Some(frames * frame_size)
}
