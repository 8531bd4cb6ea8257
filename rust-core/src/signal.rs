//! Signal smoothing, summary statistics, and threshold resolution.
//!
//! This module provides the numeric helpers the detector applies to a
//! channel's buffered history before scanning it for features:
//! - Centered moving-average smoothing with clipped edge windows
//! - Population mean and standard deviation
//! - Threshold rules, either fixed or derived from the live signal
//!
//! All functions here are pure. They take a slice and return a new value;
//! no state survives between calls.

use serde::{Deserialize, Serialize};

use crate::error::{SensingError, SensingResult};

/// Centered moving average over `series`.
///
/// Each output element is the mean of `series[i - window/2 ..= i + window/2]`
/// clipped to the series bounds, so edge windows are narrower. No padding,
/// no wrap-around.
///
/// If `series.len() <= window` the input is returned unchanged.
pub fn smooth(series: &[f64], window: usize) -> Vec<f64> {
    if series.len() <= window {
        return series.to_vec();
    }

    let half = window / 2;
    let n = series.len();

    (0..n)
        .map(|i| {
            let lo = i.saturating_sub(half);
            let hi = (i + half).min(n - 1);
            let centre = series[i];
            // Summing offsets from the centre keeps flat stretches exactly
            // flat, so rounding cannot fabricate strict extrema.
            let offset: f64 = series[lo..=hi].iter().map(|v| v - centre).sum();
            centre + offset / (hi - lo + 1) as f64
        })
        .collect()
}

/// Arithmetic mean.
///
/// An empty series is a caller bug and is reported as `EmptyInput`.
pub fn mean(series: &[f64]) -> SensingResult<f64> {
    if series.is_empty() {
        return Err(SensingError::EmptyInput);
    }
    Ok(series.iter().sum::<f64>() / series.len() as f64)
}

/// Population standard deviation (divides by N, not N-1).
pub fn std_dev(series: &[f64]) -> SensingResult<f64> {
    let m = mean(series)?;
    let variance = series.iter().map(|x| (x - m) * (x - m)).sum::<f64>() / series.len() as f64;
    Ok(variance.sqrt())
}

/// Which side of the signal a threshold guards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    /// Peaks must exceed the threshold.
    Peak,
    /// Troughs must fall below the threshold.
    Trough,
}

/// How a channel's detection threshold is obtained.
///
/// Dynamic thresholds are recomputed every cycle from the current buffer
/// contents and never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ThresholdRule {
    /// A constant threshold.
    Fixed { value: f64 },
    /// `mean + spread` for peaks, `mean - spread` for troughs, where
    /// `spread = max(k·stdDev, min_spread)`.
    ///
    /// `min_spread` is in the channel's own units. A buffer holding only
    /// resting sensor noise never clears it.
    Dynamic {
        k: f64,
        #[serde(default)]
        min_spread: f64,
    },
}

impl ThresholdRule {
    /// Resolve the threshold for `series`.
    ///
    /// Fixed rules never fail. Dynamic rules need a non-empty series.
    pub fn resolve(&self, series: &[f64], polarity: Polarity) -> SensingResult<f64> {
        match *self {
            ThresholdRule::Fixed { value } => Ok(value),
            ThresholdRule::Dynamic { k, min_spread } => {
                let base = mean(series)?;
                let spread = (k * std_dev(series)?).max(min_spread);
                Ok(match polarity {
                    Polarity::Peak => base + spread,
                    Polarity::Trough => base - spread,
                })
            }
        }
    }

    pub fn is_dynamic(&self) -> bool {
        matches!(self, ThresholdRule::Dynamic { .. })
    }

    pub(crate) fn validate(&self, channel: &str) -> SensingResult<()> {
        match *self {
            ThresholdRule::Fixed { value } if !value.is_finite() => Err(
                SensingError::InvalidConfig(format!("{channel}: fixed threshold must be finite")),
            ),
            ThresholdRule::Dynamic { k, .. } if !k.is_finite() || k < 0.0 => {
                Err(SensingError::InvalidConfig(format!(
                    "{channel}: dynamic coefficient must be finite and non-negative, got {k}"
                )))
            }
            ThresholdRule::Dynamic { min_spread, .. } if !min_spread.is_finite() || min_spread < 0.0 => {
                Err(SensingError::InvalidConfig(format!(
                    "{channel}: min_spread must be finite and non-negative, got {min_spread}"
                )))
            }
            _ => Ok(()),
        }
    }
}
