//! Shared fixtures for the CLI and config tests.
//!
//! [`opus_file`] writes a small but well-formed Opus-in-Ogg file, so the
//! tests need no media fixtures on disk.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use oggscope_demux::page::lacing_values;

/// Encode one page holding whole packets.
pub fn page(serial: u32, sequence: u32, flags: u8, granule: u64, packets: &[&[u8]]) -> Vec<u8> {
    let mut segments = Vec::new();
    let mut payload = Vec::new();
    for packet in packets {
        segments.extend(lacing_values(packet.len()));
        payload.extend_from_slice(packet);
    }

    let mut out = b"OggS".to_vec();
    out.push(0);
    out.push(flags);
    out.extend_from_slice(&granule.to_le_bytes());
    out.extend_from_slice(&serial.to_le_bytes());
    out.extend_from_slice(&sequence.to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes());
    out.push(segments.len() as u8);
    out.extend_from_slice(&segments);
    out.extend_from_slice(&payload);
    out
}

/// Stereo Opus stream: headers, then `pages` pages of ten 20 ms packets
/// (one page is 0.2 s).
pub fn opus_bytes(pages: u32) -> Vec<u8> {
    let mut head = b"OpusHead".to_vec();
    head.extend_from_slice(&[1, 2, 0, 0]);
    head.extend_from_slice(&48000u32.to_le_bytes());
    head.extend_from_slice(&[0, 0, 0]);

    let mut out = page(0x5eed, 0, 0x02, 0, &[&head]);
    out.extend(page(0x5eed, 1, 0, 0, &[b"OpusTags\0\0\0\0\0\0\0\0"]));

    let packet: Vec<u8> = std::iter::once(0xf8u8)
        .chain((1..100).map(|i| i as u8))
        .collect();
    let packets: Vec<&[u8]> = (0..10).map(|_| packet.as_slice()).collect();
    for k in 0..pages {
        let flags = if k + 1 == pages { 0x04 } else { 0 };
        let granule = (k as u64 + 1) * 9600;
        out.extend(page(0x5eed, k + 2, flags, granule, &packets));
    }
    out
}

/// Write [`opus_bytes`] into `dir`.
pub fn opus_file(dir: &Path, pages: u32) -> PathBuf {
    let path = dir.join("tone.opus");
    std::fs::write(&path, opus_bytes(pages)).unwrap();
    path
}
