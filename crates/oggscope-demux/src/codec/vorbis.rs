//! Vorbis I stream mapping.
//!
//! Three header packets (identification, comment, setup) carry an odd packet
//! type byte followed by `"vorbis"`. Audio packets have an even first byte.
//! Granule positions count PCM samples at the end of the page.

use super::{CodecHandler, CodecState, HeaderOutcome};
use crate::types::{MediaType, StreamInfo, TimeBase};

const SIGNATURE: &[u8] = b"vorbis";
const ID_HEADER_LEN: usize = 30;

/// Handler for Vorbis streams.
pub struct VorbisHandler;

impl CodecHandler for VorbisHandler {
    fn name(&self) -> &'static str {
        "vorbis"
    }

    fn magic(&self) -> &'static [u8] {
        b"\x01vorbis"
    }

    fn expected_header_count(&self) -> u32 {
        3
    }

    fn new_state(&self) -> Box<dyn CodecState> {
        Box::new(VorbisState::default())
    }
}

#[derive(Debug, Clone, Default)]
struct VorbisState {
    sample_rate: u32,
    setup_seen: bool,
}

impl CodecState for VorbisState {
    fn header(&mut self, packet: &[u8], info: &mut StreamInfo) -> HeaderOutcome {
        let Some(&kind) = packet.first() else {
            // empty packets carry no header type
            return HeaderOutcome::NotHeader;
        };

        if kind & 1 == 0 {
            if !self.setup_seen {
                return HeaderOutcome::Malformed("audio packet before setup header".into());
            }
            return HeaderOutcome::NotHeader;
        }

        if packet.len() < 7 || &packet[1..7] != SIGNATURE {
            return HeaderOutcome::Malformed("missing vorbis signature".into());
        }

        match kind {
            1 => {
                if packet.len() < ID_HEADER_LEN {
                    return HeaderOutcome::Malformed(format!(
                        "identification header is {} bytes",
                        packet.len()
                    ));
                }
                let version = u32::from_le_bytes([packet[7], packet[8], packet[9], packet[10]]);
                if version != 0 {
                    return HeaderOutcome::Malformed(format!("vorbis version {}", version));
                }
                let channels = packet[11];
                let sample_rate =
                    u32::from_le_bytes([packet[12], packet[13], packet[14], packet[15]]);
                if channels == 0 || sample_rate == 0 {
                    return HeaderOutcome::Malformed("zero channels or sample rate".into());
                }

                self.sample_rate = sample_rate;
                info.media_type = MediaType::Audio;
                info.codec = Some("vorbis");
                info.sample_rate = Some(sample_rate);
                info.channels = Some(channels as u16);
                info.time_base = TimeBase::new(1, sample_rate);
                HeaderOutcome::IsHeader
            }
            3 | 5 if self.sample_rate == 0 => {
                HeaderOutcome::Malformed("header before identification".into())
            }
            3 => HeaderOutcome::IsHeader,
            5 => {
                self.setup_seen = true;
                HeaderOutcome::IsHeader
            }
            other => HeaderOutcome::Malformed(format!("unknown header type {}", other)),
        }
    }

    fn box_clone(&self) -> Box<dyn CodecState> {
        Box::new(self.clone())
    }
}
