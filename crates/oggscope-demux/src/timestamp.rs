//! Granule position to timestamp translation.
//!
//! A page's granule position belongs to the last packet completed on that
//! page. Most codecs record the end of that packet, so its timestamp is the
//! start of the *next* packet and is held back until then. Codecs whose
//! granule marks the packet start apply it immediately.

use crate::stream::LogicalStream;

/// Timestamps for the packet just completed on `stream`.
///
/// Consumes any deferred value and, on the last packet of a page, the page
/// granule.
pub(crate) fn translate(stream: &mut LogicalStream) -> (Option<i64>, Option<i64>) {
    let mut pts = stream.pending_pts.take();
    let mut dts = stream.pending_dts.take();

    if stream.page_end {
        if let Some(granule) = stream.granule.take() {
            if let Some(codec) = &stream.codec {
                let (p, d) = codec.state.granule_to_ts(granule);
                if codec.handler.granule_is_start() {
                    pts = p;
                    dts = d;
                } else {
                    stream.pending_pts = p;
                    stream.pending_dts = d;
                }
            }
        }
    }

    (pts, dts)
}
