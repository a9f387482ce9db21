mod cli;

use oggscope::{
    config,
    report::{self, PacketRecord, ProbeReport},
};
use oggscope_demux::{OggDemuxer, SeekFlags};

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use std::path::Path;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "oggscope=trace,oggscope_demux=debug".to_string()
        } else {
            "oggscope=info,oggscope_demux=info".to_string()
        }
    });

    // Logs go to stderr so JSON output stays parseable
    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Probe { file, json } => probe_file(&file, cli.config.as_deref(), json),
        Commands::Packets {
            file,
            stream,
            limit,
            json,
        } => list_packets(&file, cli.config.as_deref(), stream, limit, json),
        Commands::Seek {
            file,
            stream,
            time,
            any,
            backward,
            count,
            json,
        } => seek_file(
            &file,
            cli.config.as_deref(),
            stream,
            time,
            SeekFlags { backward, any },
            count,
            json,
        ),
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("oggscope {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn open_file(
    file: &Path,
    config: &config::Config,
) -> Result<OggDemuxer<oggscope_demux::ReaderSource<std::fs::File>>> {
    if !file.exists() {
        anyhow::bail!("File does not exist: {:?}", file);
    }

    tracing::info!("Opening {:?}", file);
    OggDemuxer::open_path(file, config.demux.clone())
        .with_context(|| format!("Failed to open Ogg file: {:?}", file))
}

fn probe_file(file: &Path, config_path: Option<&Path>, json: bool) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let demuxer = open_file(file, &config)?;

    let size = std::fs::metadata(file)
        .with_context(|| format!("Failed to stat {:?}", file))?
        .len();
    let report = ProbeReport::new(file, Some(size), &demuxer, config.report.show_header_packets);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", report);
    }

    Ok(())
}

fn list_packets(
    file: &Path,
    config_path: Option<&Path>,
    stream: Option<usize>,
    limit: Option<usize>,
    json: bool,
) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let mut demuxer = open_file(file, &config)?;

    if let Some(index) = stream {
        if demuxer.stream(index).is_none() {
            anyhow::bail!(
                "Stream {} does not exist ({} streams)",
                index,
                demuxer.streams().len()
            );
        }
    }

    let limit = limit.unwrap_or(config.report.max_packets);
    let records = report::collect_packets(&mut demuxer, stream, limit)
        .with_context(|| format!("Failed to read packets from {:?}", file))?;
    print_packets(&records, json)
}

fn seek_file(
    file: &Path,
    config_path: Option<&Path>,
    stream: usize,
    time: f64,
    flags: SeekFlags,
    count: usize,
    json: bool,
) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let mut demuxer = open_file(file, &config)?;

    let Some(info) = demuxer.stream(stream) else {
        anyhow::bail!(
            "Stream {} does not exist ({} streams)",
            stream,
            demuxer.streams().len()
        );
    };
    let target = info.time_base.from_seconds(time);

    tracing::info!("Seeking stream {} to {}s ({} ticks)", stream, time, target);
    demuxer
        .seek(stream, target, flags)
        .with_context(|| format!("Failed to seek to {}s", time))?;

    let records = report::collect_packets(&mut demuxer, None, count)
        .with_context(|| format!("Failed to read packets from {:?}", file))?;
    print_packets(&records, json)
}

fn print_packets(records: &[PacketRecord], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(records)?);
    } else {
        for record in records {
            println!("{}", record);
        }
    }
    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            println!("✓ Configuration is valid");
            println!("  Sync window: {} bytes", config.demux.sync_window);
            println!("  Probe duration: {}", config.demux.probe_duration);
            println!("  Header errors: {:?}", config.demux.header_errors);
            println!("  Strict header count: {}", config.demux.strict_header_count);
            println!("  Max buffer size: {} bytes", config.demux.max_buffer_size);
            println!("  Max packets: {}", config.report.max_packets);
        }
        None => {
            println!("No config file specified, using defaults");
            let config = config::Config::default();
            println!("Default config:");
            println!("  Sync window: {} bytes", config.demux.sync_window);
            println!("  Max packets: {}", config.report.max_packets);
        }
    }

    Ok(())
}
