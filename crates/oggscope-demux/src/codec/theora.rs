//! Theora stream mapping.
//!
//! Header packets have the high bit of the first byte set (0x80 info, 0x81
//! comment, 0x82 setup). The granule position splits into the frame number
//! of the last keyframe (high bits) and the frames since it (low
//! `keyframe_shift` bits).

use super::{CodecHandler, CodecState, HeaderOutcome, PacketMeta};
use crate::types::{MediaType, StreamInfo, TimeBase};

const SIGNATURE: &[u8] = b"theora";
const INFO_HEADER_LEN: usize = 42;

/// Handler for Theora streams.
pub struct TheoraHandler;

impl CodecHandler for TheoraHandler {
    fn name(&self) -> &'static str {
        "theora"
    }

    fn magic(&self) -> &'static [u8] {
        b"\x80theora"
    }

    fn expected_header_count(&self) -> u32 {
        3
    }

    fn new_state(&self) -> Box<dyn CodecState> {
        Box::new(TheoraState::default())
    }
}

#[derive(Debug, Clone, Default)]
struct TheoraState {
    version: u32,
    keyframe_shift: u32,
}

fn be24(b: &[u8]) -> u32 {
    (b[0] as u32) << 16 | (b[1] as u32) << 8 | b[2] as u32
}

fn be32(b: &[u8]) -> u32 {
    u32::from_be_bytes([b[0], b[1], b[2], b[3]])
}

impl TheoraState {
    fn parse_info(&mut self, packet: &[u8], info: &mut StreamInfo) -> HeaderOutcome {
        if packet.len() < INFO_HEADER_LEN {
            return HeaderOutcome::Malformed(format!("info header is {} bytes", packet.len()));
        }

        let version = be24(&packet[7..10]);
        if version < 0x030200 {
            return HeaderOutcome::Malformed(format!("theora version {:#08x} too old", version));
        }

        let width = be24(&packet[14..17]);
        let height = be24(&packet[17..20]);
        let fps_num = be32(&packet[22..26]);
        let fps_den = be32(&packet[26..30]);
        if fps_num == 0 || fps_den == 0 {
            return HeaderOutcome::Malformed("zero frame rate".into());
        }

        // QUAL(6) then KFGSHIFT(5) straddling bytes 40 and 41
        self.keyframe_shift = ((packet[40] & 0x03) as u32) << 3 | (packet[41] >> 5) as u32;
        self.version = version;

        info.media_type = MediaType::Video;
        info.codec = Some("theora");
        info.width = Some(width);
        info.height = Some(height);
        info.time_base = TimeBase::new(fps_den, fps_num);
        HeaderOutcome::IsHeader
    }
}

impl CodecState for TheoraState {
    fn header(&mut self, packet: &[u8], info: &mut StreamInfo) -> HeaderOutcome {
        let Some(&kind) = packet.first() else {
            // zero-length data packets are dropped frames
            return HeaderOutcome::NotHeader;
        };
        if kind & 0x80 == 0 {
            return HeaderOutcome::NotHeader;
        }
        if packet.len() < 7 || &packet[1..7] != SIGNATURE {
            return HeaderOutcome::Malformed("missing theora signature".into());
        }

        match kind {
            0x80 => self.parse_info(packet, info),
            0x81 | 0x82 if self.version == 0 => {
                HeaderOutcome::Malformed("header before info header".into())
            }
            0x81 | 0x82 => HeaderOutcome::IsHeader,
            other => HeaderOutcome::Malformed(format!("unknown header type {:#04x}", other)),
        }
    }

    fn packet(&mut self, packet: &[u8], meta: &mut PacketMeta) {
        meta.keyframe = packet.first().is_some_and(|&b| b & 0x40 == 0);
        meta.duration = Some(1);
    }

    fn granule_to_ts(&self, granule: u64) -> (Option<i64>, Option<i64>) {
        let mask = (1u64 << self.keyframe_shift) - 1;
        let mut keyframe = granule >> self.keyframe_shift;
        let delta = granule & mask;
        if self.version < 0x030201 {
            keyframe += 1;
        }
        let frame = keyframe
            .checked_add(delta)
            .and_then(|f| i64::try_from(f).ok());
        (frame, frame)
    }

    fn box_clone(&self) -> Box<dyn CodecState> {
        Box::new(self.clone())
    }
}
