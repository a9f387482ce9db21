//! Timestamp search over a byte range.
//!
//! The search only needs a way to read "the first timestamp at or after this
//! offset", so it works against the [`TimestampSource`] trait. It starts
//! with linear interpolation between the known bounds, falls back to
//! bisection when interpolation stops making progress, and finally steps
//! forward one position at a time.

use crate::Result;

/// Something that can report timestamps at byte offsets.
pub trait TimestampSource {
    /// First timestamp of `stream` found reading forward from `*pos`, not
    /// starting past `limit`. On return `*pos` is the offset the timestamp
    /// belongs to.
    fn read_timestamp(&mut self, stream: usize, pos: &mut u64, limit: u64) -> Result<Option<i64>>;

    /// Offset at which timestamps start.
    fn data_offset(&self) -> u64;

    /// Total size, `None` when unknown.
    fn size(&self) -> Option<u64>;
}

/// Offset and timestamp of the last timestamped packet of `stream`.
///
/// Probes backwards from the end in doubling steps until a timestamp shows
/// up, then walks forward to the very last one.
pub fn find_last_ts<T: TimestampSource + ?Sized>(
    src: &mut T,
    stream: usize,
) -> Result<Option<(i64, u64)>> {
    let Some(size) = src.size() else {
        return Ok(None);
    };
    if size == 0 {
        return Ok(None);
    }

    let mut step = 1024u64;
    let mut pos_max = size - 1;
    let ts_max = loop {
        let limit = pos_max;
        pos_max = pos_max.saturating_sub(step);
        let ts = src.read_timestamp(stream, &mut pos_max, limit)?;
        step = step.saturating_mul(2);
        if ts.is_some() || limit.saturating_mul(2) <= step {
            break ts;
        }
    };
    let Some(mut ts_max) = ts_max else {
        return Ok(None);
    };

    loop {
        let mut pos = pos_max + 1;
        let Some(ts) = src.read_timestamp(stream, &mut pos, u64::MAX)? else {
            break;
        };
        if pos <= pos_max {
            break;
        }
        ts_max = ts;
        pos_max = pos;
        if pos >= size - 1 {
            break;
        }
    }

    Ok(Some((ts_max, pos_max)))
}

/// Locate the offset to resume reading from to reach `target` on `stream`.
///
/// Returns the chosen `(offset, timestamp)`: the bound at or before the
/// target when `backward` is set, otherwise the bound at or after it.
pub fn search_timestamp<T: TimestampSource + ?Sized>(
    src: &mut T,
    stream: usize,
    target: i64,
    backward: bool,
) -> Result<Option<(u64, i64)>> {
    let mut pos_min = src.data_offset();
    let Some(mut ts_min) = src.read_timestamp(stream, &mut pos_min, u64::MAX)? else {
        return Ok(None);
    };
    if ts_min >= target {
        return Ok(Some((pos_min, ts_min)));
    }

    let Some((mut ts_max, mut pos_max)) = find_last_ts(src, stream)? else {
        return Ok(None);
    };
    if ts_max <= target {
        return Ok(Some((pos_max, ts_max)));
    }

    let mut pos_min = pos_min as i64;
    let mut pos_max = pos_max as i64;
    let mut pos_limit = pos_max;
    let mut no_change = 0;

    while pos_min < pos_limit {
        let mut pos = match no_change {
            0 => {
                let approx_keyframe_distance = pos_max - pos_limit;
                interpolate(target - ts_min, pos_max - pos_min, ts_max - ts_min) + pos_min
                    - approx_keyframe_distance
            }
            1 => (pos_min + pos_limit) >> 1,
            _ => pos_min,
        };
        if pos <= pos_min {
            pos = pos_min + 1;
        } else if pos > pos_limit {
            pos = pos_limit;
        }
        let start_pos = pos;

        let mut found = pos as u64;
        let ts = src.read_timestamp(stream, &mut found, u64::MAX)?;
        let found = found as i64;
        if found == pos_max {
            no_change += 1;
        } else {
            no_change = 0;
        }

        let Some(ts) = ts else {
            tracing::debug!(stream, pos = start_pos, "no timestamp during search");
            return Ok(None);
        };
        tracing::trace!(stream, pos = found, ts, pos_min, pos_max, "search step");

        if target <= ts {
            pos_limit = start_pos - 1;
            pos_max = found;
            ts_max = ts;
        }
        if target >= ts {
            pos_min = found;
            ts_min = ts;
        }
    }

    Ok(Some(if backward {
        (pos_min as u64, ts_min)
    } else {
        (pos_max as u64, ts_max)
    }))
}

/// `a * b / c`, rounded to nearest.
fn interpolate(a: i64, b: i64, c: i64) -> i64 {
    if c == 0 {
        return 0;
    }
    let (a, b, c) = (a as i128, b as i128, c as i128);
    ((a * b + c / 2) / c) as i64
}
