//! Temporal correlation between channel features.
//!
//! A rep is one physical event seen on four channels. The rotation trough
//! anchors it in time; each gravity channel must show an above-threshold
//! reading close enough to that anchor.

use crate::types::{Channel, DetectionEvent, Sample};

/// Symmetric tolerance window around a reference time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CorrelationWindow {
    pub reference_ms: u64,
    pub tolerance_ms: u64,
}

impl CorrelationWindow {
    pub fn new(reference_ms: u64, tolerance_ms: u64) -> Self {
        Self {
            reference_ms,
            tolerance_ms,
        }
    }

    /// Strictly inside the window: `|t - reference| < tolerance`.
    pub fn contains(&self, timestamp_ms: u64) -> bool {
        timestamp_ms.abs_diff(self.reference_ms) < self.tolerance_ms
    }
}

/// True iff any entry exceeds `threshold` within `tolerance_ms` of `reference_ms`.
///
/// Scans the whole buffered history; the buffer itself bounds how far back
/// that reaches.
pub fn peak_within_tolerance(
    entries: &[Sample],
    threshold: f64,
    reference_ms: u64,
    tolerance_ms: u64,
) -> bool {
    correlated_peak(entries, threshold, CorrelationWindow::new(reference_ms, tolerance_ms)).is_some()
}

/// First entry that exceeds `threshold` inside `window`.
pub fn correlated_peak(entries: &[Sample], threshold: f64, window: CorrelationWindow) -> Option<&Sample> {
    entries
        .iter()
        .find(|e| e.value > threshold && window.contains(e.timestamp_ms))
}

/// Collect the correlated gravity features for a trough, or `None` if any
/// channel fails to correlate.
///
/// `channels` pairs each gravity channel with its entries and threshold.
pub fn correlate_all(
    channels: &[(Channel, &[Sample], f64)],
    window: CorrelationWindow,
) -> Option<Vec<DetectionEvent>> {
    channels
        .iter()
        .map(|(channel, entries, threshold)| {
            correlated_peak(entries, *threshold, window).map(|s| DetectionEvent {
                channel: *channel,
                timestamp_ms: s.timestamp_ms,
            })
        })
        .collect()
}
