//! FLAC-in-Ogg mapping.
//!
//! The first packet is `0x7F "FLAC"`, a mapping version, a header count,
//! `"fLaC"` and the STREAMINFO metadata block. Further metadata blocks follow
//! as header packets; audio frames start with the 0xFF sync byte.

use super::{CodecHandler, CodecState, HeaderOutcome};
use crate::types::{MediaType, StreamInfo, TimeBase};

const MAPPING_HEADER_LEN: usize = 13;
const STREAMINFO_LEN: usize = 34;

/// Handler for FLAC streams.
pub struct FlacHandler;

impl CodecHandler for FlacHandler {
    fn name(&self) -> &'static str {
        "flac"
    }

    fn magic(&self) -> &'static [u8] {
        b"\x7fFLAC"
    }

    fn expected_header_count(&self) -> u32 {
        2
    }

    fn new_state(&self) -> Box<dyn CodecState> {
        Box::new(FlacState::default())
    }
}

#[derive(Debug, Clone, Default)]
struct FlacState {
    streaminfo_seen: bool,
}

impl CodecState for FlacState {
    fn header(&mut self, packet: &[u8], info: &mut StreamInfo) -> HeaderOutcome {
        let Some(&first) = packet.first() else {
            return HeaderOutcome::NotHeader;
        };
        if first == 0xff {
            return HeaderOutcome::NotHeader;
        }

        if first != 0x7f {
            if !self.streaminfo_seen {
                return HeaderOutcome::Malformed("metadata block before STREAMINFO".into());
            }
            return HeaderOutcome::IsHeader;
        }

        if packet.len() < MAPPING_HEADER_LEN + 4 + STREAMINFO_LEN {
            return HeaderOutcome::Malformed(format!("mapping header is {} bytes", packet.len()));
        }
        if &packet[1..5] != b"FLAC" || &packet[9..13] != b"fLaC" {
            return HeaderOutcome::Malformed("missing FLAC signature".into());
        }
        if packet[5] != 1 {
            return HeaderOutcome::Malformed(format!("mapping version {}", packet[5]));
        }
        if packet[13] & 0x7f != 0 {
            return HeaderOutcome::Malformed("first metadata block is not STREAMINFO".into());
        }

        let si = &packet[17..17 + STREAMINFO_LEN];
        let sample_rate = (si[10] as u32) << 12 | (si[11] as u32) << 4 | (si[12] >> 4) as u32;
        let channels = ((si[12] >> 1) & 0x07) as u16 + 1;
        if sample_rate == 0 {
            return HeaderOutcome::Malformed("zero sample rate".into());
        }

        self.streaminfo_seen = true;
        info.media_type = MediaType::Audio;
        info.codec = Some("flac");
        info.sample_rate = Some(sample_rate);
        info.channels = Some(channels);
        info.time_base = TimeBase::new(1, sample_rate);
        HeaderOutcome::IsHeader
    }

    fn box_clone(&self) -> Box<dyn CodecState> {
        Box::new(self.clone())
    }
}
