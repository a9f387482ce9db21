//! Printable summaries of an opened Ogg file.
//!
//! Every report is `Serialize` for `--json` and implements `Display` for the
//! plain text output.

use std::fmt;
use std::path::Path;

use oggscope_demux::{ByteSource, OggDemuxer, Packet, StreamInfo};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct ProbeReport {
    pub file: String,
    pub size: Option<u64>,
    pub data_offset: Option<u64>,
    /// Longest stream duration in seconds.
    pub duration: Option<f64>,
    pub streams: Vec<StreamReport>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StreamReport {
    #[serde(flatten)]
    pub info: StreamInfo,
    pub header_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header_sizes: Option<Vec<usize>>,
    pub start_seconds: Option<f64>,
    pub duration_seconds: Option<f64>,
}

impl StreamReport {
    pub fn new(info: &StreamInfo, show_header_packets: bool) -> Self {
        Self {
            info: info.clone(),
            header_count: info.header_packets.len(),
            header_sizes: show_header_packets
                .then(|| info.header_packets.iter().map(|h| h.len()).collect()),
            start_seconds: info.start_time.map(|t| info.time_base.to_seconds(t)),
            duration_seconds: info.duration.map(|d| info.time_base.to_seconds(d)),
        }
    }
}

impl ProbeReport {
    pub fn new<S: ByteSource>(
        file: &Path,
        size: Option<u64>,
        demuxer: &OggDemuxer<S>,
        show_header_packets: bool,
    ) -> Self {
        Self {
            file: file.display().to_string(),
            size,
            data_offset: demuxer.data_offset(),
            duration: demuxer.duration().map(|d| d.as_secs_f64()),
            streams: demuxer
                .streams()
                .iter()
                .map(|info| StreamReport::new(info, show_header_packets))
                .collect(),
        }
    }
}

impl fmt::Display for ProbeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "File: {}", self.file)?;
        if let Some(size) = self.size {
            writeln!(f, "Size: {} bytes", size)?;
        }
        if let Some(offset) = self.data_offset {
            writeln!(f, "Data offset: {}", offset)?;
        }
        if let Some(duration) = self.duration {
            writeln!(f, "Duration: {}", format_time(duration))?;
        }

        writeln!(f, "\nStreams: {}", self.streams.len())?;
        for stream in &self.streams {
            let info = &stream.info;
            write!(
                f,
                "  [{}] serial {:#010x} {} {}",
                info.index,
                info.serial,
                info.media_type,
                info.codec.unwrap_or("unrecognized")
            )?;
            if let (Some(width), Some(height)) = (info.width, info.height) {
                write!(f, " {}x{}", width, height)?;
            }
            if let Some(rate) = info.sample_rate {
                write!(f, " {} Hz", rate)?;
            }
            if let Some(channels) = info.channels {
                write!(f, " {}ch", channels)?;
            }
            writeln!(f)?;

            write!(
                f,
                "      time base {}, {} header packets",
                info.time_base, stream.header_count
            )?;
            if let Some(sizes) = &stream.header_sizes {
                write!(f, " {:?}", sizes)?;
            }
            writeln!(f)?;
            if let Some(start) = stream.start_seconds {
                writeln!(f, "      start {}", format_time(start))?;
            }
            if let Some(duration) = stream.duration_seconds {
                writeln!(f, "      duration {}", format_time(duration))?;
            }
            if let Some(padding) = info.initial_padding {
                writeln!(f, "      initial padding {} samples", padding)?;
            }
        }
        Ok(())
    }
}

/// One line of a packet listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PacketRecord {
    pub stream: usize,
    pub pos: u64,
    pub size: usize,
    pub pts: Option<i64>,
    pub dts: Option<i64>,
    /// `pts` in seconds.
    pub time: Option<f64>,
    pub duration: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_trim: Option<i64>,
    pub keyframe: bool,
    pub corrupt: bool,
}

impl PacketRecord {
    pub fn new(packet: &Packet, info: Option<&StreamInfo>) -> Self {
        Self {
            stream: packet.stream_index,
            pos: packet.pos,
            size: packet.len(),
            pts: packet.pts,
            dts: packet.dts,
            time: info.and_then(|i| packet.pts.map(|p| i.time_base.to_seconds(p))),
            duration: packet.duration,
            end_trim: packet.end_trim,
            keyframe: packet.flags.keyframe,
            corrupt: packet.flags.corrupt,
        }
    }
}

impl fmt::Display for PacketRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "stream={} pos={} size={} pts={} dts={} duration={}",
            self.stream,
            self.pos,
            self.size,
            format_ts(self.pts),
            format_ts(self.dts),
            format_ts(self.duration)
        )?;
        if let Some(time) = self.time {
            write!(f, " time={:.3}", time)?;
        }
        if let Some(trim) = self.end_trim {
            write!(f, " trim={}", trim)?;
        }
        let mut flags = String::new();
        if self.keyframe {
            flags.push('K');
        }
        if self.corrupt {
            flags.push('C');
        }
        if !flags.is_empty() {
            write!(f, " flags={}", flags)?;
        }
        Ok(())
    }
}

/// Read up to `limit` packets, optionally only those of `stream`.
pub fn collect_packets<S: ByteSource>(
    demuxer: &mut OggDemuxer<S>,
    stream: Option<usize>,
    limit: usize,
) -> oggscope_demux::Result<Vec<PacketRecord>> {
    let mut records = Vec::new();
    while records.len() < limit {
        let Some(packet) = demuxer.next_packet()? else {
            break;
        };
        if stream.is_some_and(|s| s != packet.stream_index) {
            continue;
        }
        records.push(PacketRecord::new(&packet, demuxer.stream(packet.stream_index)));
    }
    Ok(records)
}

fn format_ts(ts: Option<i64>) -> String {
    ts.map_or_else(|| "-".to_string(), |t| t.to_string())
}

/// Seconds as `HH:MM:SS.mmm`.
pub fn format_time(seconds: f64) -> String {
    let millis = (seconds * 1000.0).round() as u64;
    let secs = millis / 1000;
    let mins = secs / 60;
    let hours = mins / 60;
    format!(
        "{:02}:{:02}:{:02}.{:03}",
        hours,
        mins % 60,
        secs % 60,
        millis % 1000
    )
}
