//! Oggscope - Ogg container inspection tool
//!
//! This library crate exposes configuration loading and report building for
//! the `oggscope` binary and for integration testing. The demuxer itself
//! lives in `oggscope-demux`.

pub mod config;
pub mod report;
