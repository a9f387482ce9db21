//! Seeking, timestamp reads and state snapshots.

mod common;

use std::io::Cursor;

use assert_matches::assert_matches;
use oggscope_demux::{
    DemuxConfig, DemuxError, ForwardSource, OggDemuxer, RestoreMode, SeekFlags,
};

use common::*;

const BACKWARD: SeekFlags = SeekFlags {
    backward: true,
    any: false,
};

#[test]
fn test_video_seek_lands_on_keyframe() {
    init_tracing();
    let mut demuxer = open(video_file(1, 100, 10), no_probe()).unwrap();

    demuxer.seek(0, 45, BACKWARD).unwrap();
    let packet = demuxer.next_packet().unwrap().unwrap();
    assert!(packet.is_keyframe());
    assert_eq!(frame_index(&packet.data), 40);

    demuxer.seek(0, 45, SeekFlags::default()).unwrap();
    let packet = demuxer.next_packet().unwrap().unwrap();
    assert!(packet.is_keyframe());
    assert_eq!(frame_index(&packet.data), 50);

    // the stream continues normally afterwards
    let next = demuxer.next_packet().unwrap().unwrap();
    assert_eq!(frame_index(&next.data), 51);
    assert!(!next.is_keyframe());
}

#[test]
fn test_video_seek_targets() {
    let mut demuxer = open(video_file(1, 100, 10), no_probe()).unwrap();
    for (target, expected) in [(5, 0), (17, 10), (33, 30), (58, 50), (95, 90)] {
        demuxer.seek(0, target, BACKWARD).unwrap();
        let packet = demuxer.next_packet().unwrap().unwrap();
        assert!(packet.is_keyframe(), "target {target}");
        assert_eq!(frame_index(&packet.data), expected, "target {target}");
    }
}

#[test]
fn test_seek_any_accepts_non_keyframes() {
    let mut demuxer = open(video_file(1, 100, 10), no_probe()).unwrap();
    let flags = SeekFlags {
        backward: true,
        any: true,
    };
    demuxer.seek(0, 45, flags).unwrap();
    let packet = demuxer.next_packet().unwrap().unwrap();
    assert_eq!(frame_index(&packet.data), 45);
    assert!(!packet.is_keyframe());
}

#[test]
fn test_audio_seek() {
    let mut demuxer = open(audio_file(1, 50), no_probe()).unwrap();

    demuxer.seek(0, 2550, BACKWARD).unwrap();
    let packet = demuxer.next_packet().unwrap().unwrap();
    assert_eq!(frame_index(&packet.data), 25);

    demuxer.seek(0, 2550, SeekFlags::default()).unwrap();
    let packet = demuxer.next_packet().unwrap().unwrap();
    assert_eq!(frame_index(&packet.data), 26);
    let next = demuxer.next_packet().unwrap().unwrap();
    assert_eq!(next.pts, Some(2700));
}

#[test]
fn test_seek_past_end_lands_on_last_timestamp() {
    let mut demuxer = open(audio_file(1, 20), no_probe()).unwrap();
    demuxer.seek(0, 1_000_000, BACKWARD).unwrap();
    let packet = demuxer.next_packet().unwrap().unwrap();
    assert!(frame_index(&packet.data) >= 18);
}

#[test]
fn test_read_timestamp() {
    let mut demuxer = open(audio_file(1, 10), no_probe()).unwrap();
    let start = demuxer.data_offset().unwrap();

    let mut pos = start;
    assert_eq!(demuxer.read_timestamp(0, &mut pos, u64::MAX).unwrap(), Some(0));
    assert_eq!(pos, start);

    let mut pos = start + 1;
    let ts = demuxer.read_timestamp(0, &mut pos, u64::MAX).unwrap();
    assert_eq!(ts, Some(200));
    assert!(pos > start);

    let mut pos = start + 1;
    assert_eq!(demuxer.read_timestamp(0, &mut pos, start + 1).unwrap(), None);

    assert_matches!(
        demuxer.read_timestamp(3, &mut pos, u64::MAX),
        Err(DemuxError::InvalidStream(3))
    );
}

#[test]
fn test_seek_errors() {
    let mut demuxer = open(audio_file(1, 10), no_probe()).unwrap();
    assert_matches!(
        demuxer.seek(2, 0, SeekFlags::default()),
        Err(DemuxError::InvalidStream(2))
    );

    let source = ForwardSource::new(Cursor::new(audio_file(1, 10)));
    let mut forward = OggDemuxer::open(source, registry(), DemuxConfig::default()).unwrap();
    assert_matches!(
        forward.seek(0, 100, SeekFlags::default()),
        Err(DemuxError::NotSeekable)
    );
    let packet = forward.next_packet().unwrap().unwrap();
    assert_eq!(frame_index(&packet.data), 0);
}

#[test]
fn test_snapshot_rewind() {
    let mut demuxer = open(audio_file(1, 10), no_probe()).unwrap();
    demuxer.next_packet().unwrap().unwrap();
    let pos = demuxer.position();

    demuxer.save_state();
    let ahead: Vec<_> = (0..3)
        .map(|_| demuxer.next_packet().unwrap().unwrap())
        .collect();
    demuxer.restore_state(RestoreMode::Rewind).unwrap();

    assert_eq!(demuxer.position(), pos);
    assert_eq!(demuxer.saved_states(), 0);
    for expected in ahead {
        assert_eq!(demuxer.next_packet().unwrap().unwrap(), expected);
    }
}

#[test]
fn test_snapshot_discard_and_nesting() {
    let mut demuxer = open(audio_file(1, 10), no_probe()).unwrap();

    demuxer.save_state();
    demuxer.save_state();
    assert_eq!(demuxer.saved_states(), 2);

    demuxer.next_packet().unwrap().unwrap();
    demuxer.restore_state(RestoreMode::Discard).unwrap();
    let packet = demuxer.next_packet().unwrap().unwrap();
    assert_eq!(frame_index(&packet.data), 1);

    demuxer.restore_state(RestoreMode::Rewind).unwrap();
    let packet = demuxer.next_packet().unwrap().unwrap();
    assert_eq!(frame_index(&packet.data), 0);
    assert_eq!(packet.pts, None);
}

#[test]
fn test_restore_without_snapshot_is_noop() {
    let mut demuxer = open(audio_file(1, 4), no_probe()).unwrap();
    let pos = demuxer.position();
    demuxer.restore_state(RestoreMode::Rewind).unwrap();
    assert_eq!(demuxer.position(), pos);
    let packet = demuxer.next_packet().unwrap().unwrap();
    assert_eq!(frame_index(&packet.data), 0);
}
