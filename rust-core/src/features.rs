//! Local-extremum feature scan.
//!
//! A feature is a strict local maximum (peak) or minimum (trough): an
//! interior point that strictly dominates both neighbours and clears the
//! channel threshold. Plateaus never count, so monotonic drift and flat
//! noise floors produce no features.
//!
//! Every scan is a single O(n) pass. Series shorter than three points have
//! no interior and yield "no feature" rather than an error.

use crate::error::{SensingError, SensingResult};
use crate::types::Sample;

/// Smallest series that has an interior point.
pub const MIN_WINDOW: usize = 3;

/// Check that a series is long enough to contain an interior point.
pub fn ensure_window(len: usize) -> SensingResult<()> {
    if len < MIN_WINDOW {
        return Err(SensingError::InsufficientData {
            required: MIN_WINDOW,
            actual: len,
        });
    }
    Ok(())
}

/// True iff some interior `series[i]` is a strict local maximum above `threshold`.
pub fn has_peak(series: &[f64], threshold: f64) -> bool {
    peak_index(series, threshold).is_some()
}

/// Index of the first strict local maximum above `threshold`.
pub fn peak_index(series: &[f64], threshold: f64) -> Option<usize> {
    if ensure_window(series.len()).is_err() {
        return None;
    }
    series
        .windows(3)
        .position(|w| w[1] > w[0] && w[1] > w[2] && w[1] > threshold)
        .map(|i| i + 1)
}

/// Index of the first strict local minimum below `threshold`.
pub fn trough_index(series: &[f64], threshold: f64) -> Option<usize> {
    if ensure_window(series.len()).is_err() {
        return None;
    }
    series
        .windows(3)
        .position(|w| w[1] < w[0] && w[1] < w[2] && w[1] < threshold)
        .map(|i| i + 1)
}

/// True iff some interior `series[i]` is a strict local minimum below `threshold`.
pub fn has_trough(series: &[f64], threshold: f64) -> bool {
    trough_index(series, threshold).is_some()
}

/// Timestamp of the first qualifying trough, scanning oldest to newest.
pub fn trough_time(entries: &[Sample], threshold: f64) -> Option<u64> {
    if ensure_window(entries.len()).is_err() {
        return None;
    }
    entries
        .windows(3)
        .find(|w| w[1].value < w[0].value && w[1].value < w[2].value && w[1].value < threshold)
        .map(|w| w[1].timestamp_ms)
}

/// Timestamp of the first qualifying peak, scanning oldest to newest.
pub fn peak_time(entries: &[Sample], threshold: f64) -> Option<u64> {
    if ensure_window(entries.len()).is_err() {
        return None;
    }
    entries
        .windows(3)
        .find(|w| w[1].value > w[0].value && w[1].value > w[2].value && w[1].value > threshold)
        .map(|w| w[1].timestamp_ms)
}

/// Pair values with timestamps, e.g. a smoothed series with its buffer's clock.
///
/// Extra elements on either side are dropped.
pub fn zip_entries(values: &[f64], timestamps: &[u64]) -> Vec<Sample> {
    values
        .iter()
        .zip(timestamps)
        .map(|(&v, &t)| Sample::new(v, t))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timed(values: &[f64]) -> Vec<Sample> {
        values
            .iter()
            .enumerate()
            .map(|(i, &v)| Sample::new(v, 1000 + i as u64 * 16))
            .collect()
    }

    #[test]
    fn test_peak_strictly_above_threshold() {
        let series = [0.0, 1.0, 3.0, 1.0, 0.0];
        assert!(has_peak(&series, 2.0));
        assert_eq!(peak_index(&series, 2.0), Some(2));
        assert!(!has_peak(&series, 3.0), "equal to threshold is not above it");
    }

    #[test]
    fn test_trough_time_returns_timestamp() {
        let entries = [Sample::new(5.0, 10), Sample::new(1.0, 27), Sample::new(4.0, 43)];
        assert_eq!(trough_time(&entries, 2.0), Some(27));
        assert_eq!(trough_time(&entries, 1.0), None);
    }

    #[test]
    fn test_first_qualifying_trough_wins() {
        let entries = timed(&[0.0, -3.0, 0.0, -5.0, 0.0]);
        assert_eq!(trough_time(&entries, -2.0), Some(1016));
        assert_eq!(trough_time(&entries, -4.0), Some(1048));
    }

    #[test]
    fn test_monotonic_series_has_no_features() {
        let rising: Vec<f64> = (0..50).map(|i| i as f64 * 0.1).collect();
        let falling: Vec<f64> = rising.iter().rev().copied().collect();

        for threshold in [-100.0, 0.0, 2.5, 100.0] {
            assert!(!has_peak(&rising, threshold));
            assert!(!has_peak(&falling, threshold));
            assert_eq!(trough_time(&timed(&rising), threshold), None);
            assert_eq!(trough_time(&timed(&falling), threshold), None);
        }
    }

    #[test]
    fn test_plateau_is_not_an_extremum() {
        let series = [0.0, 2.0, 2.0, 0.0];
        assert!(!has_peak(&series, 1.0));
        let dip = [0.0, -2.0, -2.0, 0.0];
        assert!(!has_trough(&dip, -1.0));
    }

    #[test]
    fn test_short_series_yield_no_feature() {
        assert!(!has_peak(&[], 0.0));
        assert!(!has_peak(&[1.0, 2.0], 0.0));
        assert_eq!(trough_time(&timed(&[0.0, -1.0]), 0.0), None);
        assert_eq!(peak_time(&timed(&[1.0]), 0.0), None);
        assert!(matches!(
            ensure_window(2),
            Err(SensingError::InsufficientData { required: 3, actual: 2 })
        ));
        assert!(ensure_window(3).is_ok());
    }

    #[test]
    fn test_edges_are_not_interior() {
        // Maximum sits on the last sample; no right neighbour
        let series = [0.0, 1.0, 2.0, 5.0];
        assert!(!has_peak(&series, 0.0));
    }

    #[test]
    fn test_peak_time() {
        let entries = timed(&[0.0, 0.2, 0.9, 0.3, 0.1]);
        assert_eq!(peak_time(&entries, 0.5), Some(1032));
    }

    #[test]
    fn test_zip_entries_truncates_to_shorter() {
        let zipped = zip_entries(&[1.0, 2.0, 3.0], &[10, 20]);
        assert_eq!(zipped, vec![Sample::new(1.0, 10), Sample::new(2.0, 20)]);
    }
}
