use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "oggscope")]
#[command(author, version, about = "Ogg container inspection tool")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Probe an Ogg file and display its streams
    Probe {
        /// File to probe
        #[arg(required = true)]
        file: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the data packets of an Ogg file
    Packets {
        /// File to read
        #[arg(required = true)]
        file: PathBuf,

        /// Only list packets of this stream
        #[arg(short, long)]
        stream: Option<usize>,

        /// Maximum number of packets (defaults to report.max_packets)
        #[arg(short, long)]
        limit: Option<usize>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Seek to a time and show the packets delivered from there
    Seek {
        /// File to read
        #[arg(required = true)]
        file: PathBuf,

        /// Stream whose timestamps drive the seek
        #[arg(short, long, default_value = "0")]
        stream: usize,

        /// Target time in seconds
        #[arg(short, long)]
        time: f64,

        /// Land on any packet, not only keyframes
        #[arg(long)]
        any: bool,

        /// Land at or before the target
        #[arg(long)]
        backward: bool,

        /// Number of packets to show after the seek
        #[arg(long, default_value = "5")]
        count: usize,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },

    /// Display version information
    Version,
}
