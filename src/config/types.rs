use oggscope_demux::DemuxConfig;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    /// Demuxer tunables, passed straight to `OggDemuxer::open`.
    #[serde(default)]
    pub demux: DemuxConfig,

    #[serde(default)]
    pub report: ReportConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReportConfig {
    /// Packets listed by `oggscope packets` when no limit is given
    #[serde(default = "default_max_packets")]
    pub max_packets: usize,

    /// Include the size of every header packet in probe reports
    #[serde(default)]
    pub show_header_packets: bool,
}

fn default_max_packets() -> usize {
    100
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            max_packets: default_max_packets(),
            show_header_packets: false,
        }
    }
}
