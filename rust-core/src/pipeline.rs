//! Rep counting pipeline integrating every processing stage.
//!
//! This module owns all mutable state of a monitoring session and runs the
//! per-sample flow from a raw motion reading to a counted rep.
//!
//! # Architecture
//!
//! Each ingested sample goes through:
//! 1. **Validation**: non-finite values and out-of-order timestamps are rejected
//! 2. **Buffering**: the reading fans out to one rolling buffer per channel
//! 3. **Feature scan**: rotation trough and gravity peaks against thresholds
//! 4. **Correlation**: gravity peaks must sit near the rotation trough in time
//! 5. **Latch**: a rising edge counts one rep and notifies observers
//!
//! Two detection modes exist. `Raw` scans the unfiltered buffers and only
//! requires the four features to share the buffer. `Refined` smooths every
//! channel, derives thresholds from the live signal, and anchors the gravity
//! peaks on the trough timestamp.
//!
//! # Threading
//! `RepCounter` is single-owner. Hosts that deliver samples from more than
//! one thread wrap it in [`SharedRepCounter`].

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace, warn};

use crate::buffer::{ChannelBuffers, SampleBuffer, DEFAULT_CAPACITY, MAX_CAPACITY};
use crate::correlation::{correlate_all, CorrelationWindow};
use crate::error::{SensingError, SensingResult};
use crate::features::{self, MIN_WINDOW};
use crate::latch::{DebouncePolicy, LatchTransition, RepLatch, DEFAULT_DEBOUNCE_MS};
use crate::signal::{self, Polarity, ThresholdRule};
use crate::types::{Channel, MotionSample, RepEvent, Sample};

/// How the buffered history is turned into a detection condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionMode {
    /// Unfiltered buffers; features only need to coexist in the buffer.
    Raw,
    /// Smoothed buffers, live thresholds, trough-anchored correlation.
    #[default]
    Refined,
}

/// Threshold rule for each channel.
///
/// The rotation rule guards troughs, the gravity rules guard peaks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelThresholds {
    pub rotation_y: ThresholdRule,
    pub gravity_x: ThresholdRule,
    pub gravity_y: ThresholdRule,
    pub gravity_z: ThresholdRule,
}

impl ChannelThresholds {
    /// Fixed thresholds for raw mode.
    pub fn fixed() -> Self {
        Self {
            rotation_y: ThresholdRule::Fixed { value: -1.0 },
            gravity_x: ThresholdRule::Fixed { value: 0.4 },
            gravity_y: ThresholdRule::Fixed { value: 0.4 },
            gravity_z: ThresholdRule::Fixed { value: 0.4 },
        }
    }

    pub fn get(&self, channel: Channel) -> ThresholdRule {
        match channel {
            Channel::RotationY => self.rotation_y,
            Channel::GravityX => self.gravity_x,
            Channel::GravityY => self.gravity_y,
            Channel::GravityZ => self.gravity_z,
        }
    }
}

/// Smallest trough depth below the mean counted on rotation (rad/s).
pub const ROTATION_MIN_SPREAD: f64 = 0.5;
/// Smallest peak height above the mean counted on a gravity axis (g).
pub const GRAVITY_MIN_SPREAD: f64 = 0.15;

impl Default for ChannelThresholds {
    fn default() -> Self {
        let gravity = ThresholdRule::Dynamic {
            k: 1.0,
            min_spread: GRAVITY_MIN_SPREAD,
        };
        Self {
            rotation_y: ThresholdRule::Dynamic {
                k: 1.0,
                min_spread: ROTATION_MIN_SPREAD,
            },
            gravity_x: gravity,
            gravity_y: gravity,
            gravity_z: gravity,
        }
    }
}

/// Configuration for the rep counter.
///
/// Every detection constant lives here so it can be tuned without
/// recompiling. Loadable from JSON; missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepCounterConfig {
    /// Samples kept per channel. ~1.7s at 60Hz.
    pub window_capacity: usize,
    /// Centered moving-average width used in refined mode.
    pub smoothing_window: usize,
    /// Minimum time a rep stays latched after triggering (ms).
    pub debounce_ms: u64,
    /// Max distance between the rotation trough and each gravity peak (ms).
    pub correlation_tolerance_ms: u64,
    pub mode: DetectionMode,
    pub debounce_policy: DebouncePolicy,
    pub thresholds: ChannelThresholds,
}

impl Default for RepCounterConfig {
    fn default() -> Self {
        Self {
            window_capacity: DEFAULT_CAPACITY,
            smoothing_window: 5,
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            correlation_tolerance_ms: 500,
            mode: DetectionMode::Refined,
            debounce_policy: DebouncePolicy::HoldUntilTimeout,
            thresholds: ChannelThresholds::default(),
        }
    }
}

impl RepCounterConfig {
    /// Raw-threshold preset: no smoothing, fixed thresholds.
    pub fn raw() -> Self {
        Self {
            mode: DetectionMode::Raw,
            thresholds: ChannelThresholds::fixed(),
            ..Self::default()
        }
    }

    /// Parse and validate a JSON document.
    pub fn from_json(json: &str) -> SensingResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> SensingResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject values the detector cannot work with.
    pub fn validate(&self) -> SensingResult<()> {
        if !(MIN_WINDOW..=MAX_CAPACITY).contains(&self.window_capacity) {
            return Err(SensingError::InvalidConfig(format!(
                "window_capacity must be between {MIN_WINDOW} and {MAX_CAPACITY}, got {}",
                self.window_capacity
            )));
        }
        if self.smoothing_window == 0 {
            return Err(SensingError::InvalidConfig(
                "smoothing_window must be at least 1".to_string(),
            ));
        }
        for channel in Channel::ALL {
            self.thresholds.get(channel).validate(channel.name())?;
        }
        Ok(())
    }
}

/// One channel prepared for a detection cycle.
struct ChannelView {
    values: Vec<f64>,
    entries: Vec<Sample>,
    threshold: f64,
}

/// Features that satisfied the detection condition in one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Detection {
    trough_ms: u64,
    /// Gravity peak times in `Channel::GRAVITY` order.
    peaks_ms: [u64; 3],
}

type RepObserver = Box<dyn FnMut(&RepEvent) + Send>;
type ResetObserver = Box<dyn FnMut() + Send>;

/// Rep counter for one monitoring session.
///
/// Owns the channel buffers, the latch, and the observer lists. Every other
/// stage is a pure function over data handed out from here.
pub struct RepCounter {
    config: RepCounterConfig,
    buffers: ChannelBuffers,
    latch: RepLatch,
    samples_seen: u64,
    rep_observers: Vec<RepObserver>,
    reset_observers: Vec<ResetObserver>,
}

impl RepCounter {
    /// Create a counter after validating `config`.
    pub fn new(config: RepCounterConfig) -> SensingResult<Self> {
        config.validate()?;
        info!(
            mode = ?config.mode,
            policy = ?config.debounce_policy,
            window = config.window_capacity,
            "rep counter created"
        );
        Ok(Self::from_validated(config))
    }

    fn from_validated(config: RepCounterConfig) -> Self {
        Self {
            buffers: ChannelBuffers::new(config.window_capacity),
            latch: RepLatch::new(config.debounce_policy, config.debounce_ms),
            samples_seen: 0,
            rep_observers: Vec::new(),
            reset_observers: Vec::new(),
            config,
        }
    }

    /// Register a callback invoked synchronously on every counted rep.
    pub fn on_rep<F>(&mut self, callback: F)
    where
        F: FnMut(&RepEvent) + Send + 'static,
    {
        self.rep_observers.push(Box::new(callback));
    }

    /// Register a callback invoked synchronously on every reset.
    pub fn on_reset<F>(&mut self, callback: F)
    where
        F: FnMut() + Send + 'static,
    {
        self.reset_observers.push(Box::new(callback));
    }

    /// Process one motion reading.
    ///
    /// Returns the emitted event when this reading completed a rep. Invalid
    /// readings are rejected without touching any state.
    pub fn ingest(&mut self, sample: &MotionSample) -> SensingResult<Option<RepEvent>> {
        if let Some(channel) = sample.first_non_finite() {
            warn!(%channel, timestamp_ms = sample.timestamp_ms, "rejecting non-finite sample");
            return Err(SensingError::NonFiniteSample { channel });
        }
        if let Some(previous_ms) = self.buffers.latest_timestamp() {
            if sample.timestamp_ms < previous_ms {
                warn!(previous_ms, timestamp_ms = sample.timestamp_ms, "rejecting out-of-order sample");
                return Err(SensingError::NonMonotonicTimestamp {
                    previous_ms,
                    timestamp_ms: sample.timestamp_ms,
                });
            }
        }

        self.buffers.push(sample);
        self.samples_seen += 1;

        let detection = self.evaluate()?;
        let transition = self.latch.update(detection.is_some(), sample.timestamp_ms);

        match (transition, detection) {
            (LatchTransition::Triggered { count }, Some(found)) => {
                let event = RepEvent {
                    count,
                    timestamp_ms: sample.timestamp_ms,
                    trough_ms: Some(found.trough_ms),
                    peaks_ms: found.peaks_ms,
                };
                debug!(
                    count,
                    timestamp_ms = event.timestamp_ms,
                    trough_ms = found.trough_ms,
                    peaks_ms = ?found.peaks_ms,
                    "rep counted"
                );
                for observer in &mut self.rep_observers {
                    observer(&event);
                }
                Ok(Some(event))
            }
            (LatchTransition::Released, _) => {
                trace!(timestamp_ms = sample.timestamp_ms, "latch released");
                Ok(None)
            }
            _ => Ok(None),
        }
    }

    /// Process a batch of readings and return every emitted event.
    ///
    /// Stops at the first rejected reading.
    pub fn ingest_batch(&mut self, samples: &[MotionSample]) -> SensingResult<Vec<RepEvent>> {
        let mut events = Vec::new();
        for sample in samples {
            if let Some(event) = self.ingest(sample)? {
                events.push(event);
            }
        }
        Ok(events)
    }

    /// Zero the count and release the latch. Buffers are left untouched.
    pub fn reset(&mut self) {
        self.latch.reset();
        info!("rep counter reset");
        for observer in &mut self.reset_observers {
            observer();
        }
    }

    /// Current rep count.
    pub fn count(&self) -> u64 {
        self.latch.count()
    }

    pub fn is_latched(&self) -> bool {
        self.latch.is_latched()
    }

    /// Total readings accepted this session.
    pub fn samples_seen(&self) -> u64 {
        self.samples_seen
    }

    pub fn config(&self) -> &RepCounterConfig {
        &self.config
    }

    /// Buffered history for a channel.
    pub fn buffer(&self, channel: Channel) -> &SampleBuffer {
        self.buffers.get(channel)
    }

    // =========================================================================
    // DETECTION
    // =========================================================================

    fn evaluate(&self) -> SensingResult<Option<Detection>> {
        match self.config.mode {
            DetectionMode::Raw => self.evaluate_raw(),
            DetectionMode::Refined => self.evaluate_refined(),
        }
    }

    fn view(&self, channel: Channel, smoothed: bool) -> SensingResult<ChannelView> {
        let buffer = self.buffers.get(channel);
        let values = if smoothed {
            signal::smooth(&buffer.values(), self.config.smoothing_window)
        } else {
            buffer.values()
        };
        let polarity = match channel {
            Channel::RotationY => Polarity::Trough,
            _ => Polarity::Peak,
        };
        let threshold = self.config.thresholds.get(channel).resolve(&values, polarity)?;
        let entries = features::zip_entries(&values, &buffer.timestamps());
        Ok(ChannelView {
            values,
            entries,
            threshold,
        })
    }

    fn evaluate_raw(&self) -> SensingResult<Option<Detection>> {
        let rotation = self.view(Channel::RotationY, false)?;
        let trough_ms = match features::trough_time(&rotation.entries, rotation.threshold) {
            Some(t) => t,
            None => return Ok(None),
        };

        let mut peaks_ms = [0; 3];
        for (slot, channel) in peaks_ms.iter_mut().zip(Channel::GRAVITY) {
            let view = self.view(channel, false)?;
            match features::peak_time(&view.entries, view.threshold) {
                Some(timestamp_ms) => *slot = timestamp_ms,
                None => return Ok(None),
            }
        }

        Ok(Some(Detection { trough_ms, peaks_ms }))
    }

    fn evaluate_refined(&self) -> SensingResult<Option<Detection>> {
        let rotation = self.view(Channel::RotationY, true)?;
        // No trough means no anchor; correlation is skipped.
        let trough_ms = match features::trough_time(&rotation.entries, rotation.threshold) {
            Some(t) => t,
            None => return Ok(None),
        };

        let gravity = Channel::GRAVITY
            .into_iter()
            .map(|c| self.view(c, true))
            .collect::<SensingResult<Vec<_>>>()?;
        if !gravity.iter().all(|v| features::has_peak(&v.values, v.threshold)) {
            return Ok(None);
        }

        let window = CorrelationWindow::new(trough_ms, self.config.correlation_tolerance_ms);
        let inputs: Vec<(Channel, &[Sample], f64)> = Channel::GRAVITY
            .into_iter()
            .zip(&gravity)
            .map(|(c, v)| (c, v.entries.as_slice(), v.threshold))
            .collect();

        Ok(correlate_all(&inputs, window).map(|found| {
            let mut peaks_ms = [0; 3];
            for (slot, event) in peaks_ms.iter_mut().zip(&found) {
                *slot = event.timestamp_ms;
            }
            Detection { trough_ms, peaks_ms }
        }))
    }
}

impl Default for RepCounter {
    fn default() -> Self {
        Self::from_validated(RepCounterConfig::default())
    }
}

/// Thread-safe handle around a [`RepCounter`].
///
/// Serializes `ingest` and `reset` behind one mutex. Observers run while the
/// lock is held and must not call back into the same handle.
#[derive(Clone)]
pub struct SharedRepCounter {
    inner: Arc<Mutex<RepCounter>>,
}

impl SharedRepCounter {
    pub fn new(counter: RepCounter) -> Self {
        Self {
            inner: Arc::new(Mutex::new(counter)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, RepCounter> {
        // A panicking observer must not wedge the session.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn ingest(&self, sample: &MotionSample) -> SensingResult<Option<RepEvent>> {
        self.lock().ingest(sample)
    }

    pub fn reset(&self) {
        self.lock().reset()
    }

    pub fn count(&self) -> u64 {
        self.lock().count()
    }

    pub fn samples_seen(&self) -> u64 {
        self.lock().samples_seen()
    }

    pub fn on_rep<F>(&self, callback: F)
    where
        F: FnMut(&RepEvent) + Send + 'static,
    {
        self.lock().on_rep(callback)
    }

    pub fn on_reset<F>(&self, callback: F)
    where
        F: FnMut() + Send + 'static,
    {
        self.lock().on_reset(callback)
    }
}

impl From<RepCounter> for SharedRepCounter {
    fn from(counter: RepCounter) -> Self {
        Self::new(counter)
    }
}
