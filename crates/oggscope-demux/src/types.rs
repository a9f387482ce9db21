//! Caller-visible stream descriptors and packets.

use std::fmt;
use std::time::Duration;

use bytes::Bytes;

/// Broad kind of content carried by a logical stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum MediaType {
    Audio,
    Video,
    #[default]
    Unknown,
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaType::Audio => write!(f, "audio"),
            MediaType::Video => write!(f, "video"),
            MediaType::Unknown => write!(f, "unknown"),
        }
    }
}

/// Rational unit of a stream's timestamps (`num / den` seconds per tick).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TimeBase {
    pub num: u32,
    pub den: u32,
}

impl TimeBase {
    /// Microsecond ticks, used until a codec handler knows better.
    pub const MICROS: TimeBase = TimeBase {
        num: 1,
        den: 1_000_000,
    };

    pub fn new(num: u32, den: u32) -> Self {
        Self { num, den }
    }

    /// Convert ticks to seconds.
    pub fn to_seconds(self, ticks: i64) -> f64 {
        if self.den == 0 {
            return 0.0;
        }
        ticks as f64 * self.num as f64 / self.den as f64
    }

    /// Convert seconds to the nearest tick.
    pub fn from_seconds(self, seconds: f64) -> i64 {
        if self.num == 0 {
            return 0;
        }
        (seconds * self.den as f64 / self.num as f64).round() as i64
    }

    /// Convert ticks to a [`Duration`]; negative values have none.
    pub fn to_duration(self, ticks: i64) -> Option<Duration> {
        if ticks < 0 || self.den == 0 {
            return None;
        }
        let nanos = ticks as u128 * self.num as u128 * 1_000_000_000 / self.den as u128;
        Some(Duration::from_nanos(u64::try_from(nanos).ok()?))
    }
}

impl Default for TimeBase {
    fn default() -> Self {
        Self::MICROS
    }
}

impl fmt::Display for TimeBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.num, self.den)
    }
}

/// Description of one logical stream as seen by the caller.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct StreamInfo {
    /// Index used in [`Packet::stream_index`].
    pub index: usize,
    pub serial: u32,
    pub media_type: MediaType,
    /// Codec name, set once a handler recognizes the stream.
    pub codec: Option<&'static str>,
    pub time_base: TimeBase,
    /// First timestamp, in `time_base` units.
    pub start_time: Option<i64>,
    /// Length of the stream, in `time_base` units.
    pub duration: Option<i64>,
    pub sample_rate: Option<u32>,
    pub channels: Option<u16>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    /// Samples the decoder should drop at the start.
    pub initial_padding: Option<u32>,
    /// Header packets accepted by the codec handler, in order.
    #[cfg_attr(feature = "serde", serde(skip))]
    pub header_packets: Vec<Bytes>,
}

impl StreamInfo {
    pub fn new(index: usize, serial: u32) -> Self {
        Self {
            index,
            serial,
            ..Default::default()
        }
    }

    /// Duration as wall-clock time.
    pub fn duration_time(&self) -> Option<Duration> {
        self.duration.and_then(|d| self.time_base.to_duration(d))
    }
}

/// Per-packet flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct PacketFlags {
    /// Independently decodable.
    pub keyframe: bool,
    /// Assembled across a gap in page sequence numbers.
    pub corrupt: bool,
}

/// A reconstructed packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub stream_index: usize,
    pub data: Bytes,
    pub pts: Option<i64>,
    pub dts: Option<i64>,
    pub flags: PacketFlags,
    pub duration: Option<i64>,
    /// Samples to discard from the end of the decoded packet.
    pub end_trim: Option<i64>,
    /// File offset of the first page that contributed to this packet.
    pub pos: u64,
}

impl Packet {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn is_keyframe(&self) -> bool {
        self.flags.keyframe
    }
}

/// Options for [`OggDemuxer::seek`](crate::OggDemuxer::seek).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeekFlags {
    /// Land at or before the target instead of at or after it.
    pub backward: bool,
    /// Accept any packet, not only keyframes.
    pub any: bool,
}
