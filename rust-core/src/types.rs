//! Core data types for the repetition counting engine.
//!
//! This module defines the values that flow between the processing stages:
//! single-channel samples, the multi-channel reading delivered by the host
//! sensor API, transient detection events, and the event emitted when a rep
//! is counted.
//!
//! Design principle: Types should make intent obvious. If a concept exists,
//! it gets a type. Channel identity is an enum, never a string or an index.

use serde::{Deserialize, Serialize};

/// One of the four motion channels the detector watches.
///
/// The set is fixed: channels are never added or removed at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    /// Angular rotation rate about the device Y axis (rad/s).
    RotationY,
    /// Gravity vector component along X (in g).
    GravityX,
    /// Gravity vector component along Y (in g).
    GravityY,
    /// Gravity vector component along Z (in g).
    GravityZ,
}

impl Channel {
    /// All channels in buffer order.
    pub const ALL: [Channel; 4] = [
        Channel::RotationY,
        Channel::GravityX,
        Channel::GravityY,
        Channel::GravityZ,
    ];

    /// The three gravity channels, which are scanned for peaks.
    pub const GRAVITY: [Channel; 3] = [Channel::GravityX, Channel::GravityY, Channel::GravityZ];

    /// Position of this channel in per-channel arrays.
    pub fn index(&self) -> usize {
        match self {
            Channel::RotationY => 0,
            Channel::GravityX => 1,
            Channel::GravityY => 2,
            Channel::GravityZ => 3,
        }
    }

    /// Short lowercase name used in logs and CLI output.
    pub fn name(&self) -> &'static str {
        match self {
            Channel::RotationY => "rotation_y",
            Channel::GravityX => "gravity_x",
            Channel::GravityY => "gravity_y",
            Channel::GravityZ => "gravity_z",
        }
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A single reading of one channel.
///
/// Immutable once created. Timestamps are monotonic milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Measured value.
    pub value: f64,
    /// Monotonic timestamp in milliseconds.
    pub timestamp_ms: u64,
}

impl Sample {
    pub fn new(value: f64, timestamp_ms: u64) -> Self {
        Self { value, timestamp_ms }
    }
}

/// One multi-channel reading as delivered by the host motion API.
///
/// This is the minimal input contract: rotation rate about Y, the three
/// gravity components, and a monotonic timestamp. Typical delivery rate is
/// 60Hz.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotionSample {
    /// Monotonic timestamp in milliseconds. Required for temporal ordering.
    pub timestamp_ms: u64,
    /// Rotation rate about Y in rad/s.
    pub rotation_y: f64,
    /// Gravity vector [x, y, z] in g.
    pub gravity: [f64; 3],
}

impl MotionSample {
    /// Creates a new motion sample.
    ///
    /// Assumptions:
    /// - timestamp_ms must be monotonically non-decreasing within a session
    /// - values are already calibrated by the host motion API
    pub fn new(timestamp_ms: u64, rotation_y: f64, gravity: [f64; 3]) -> Self {
        Self {
            timestamp_ms,
            rotation_y,
            gravity,
        }
    }

    /// Value of a given channel in this reading.
    pub fn value(&self, channel: Channel) -> f64 {
        match channel {
            Channel::RotationY => self.rotation_y,
            Channel::GravityX => self.gravity[0],
            Channel::GravityY => self.gravity[1],
            Channel::GravityZ => self.gravity[2],
        }
    }

    /// Split into per-channel samples, in `Channel::ALL` order.
    pub fn channel_samples(&self) -> [(Channel, Sample); 4] {
        Channel::ALL.map(|c| (c, Sample::new(self.value(c), self.timestamp_ms)))
    }

    /// First channel carrying a NaN or infinite value, if any.
    pub fn first_non_finite(&self) -> Option<Channel> {
        Channel::ALL.into_iter().find(|c| !self.value(*c).is_finite())
    }
}

/// A feature found in one channel during a detection cycle.
///
/// Produced transiently by the feature scan; never stored beyond the cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetectionEvent {
    pub channel: Channel,
    pub timestamp_ms: u64,
}

/// Emitted once per counted repetition.
///
/// This is the single observation point for external collaborators such as
/// haptic feedback or a UI counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepEvent {
    /// Running count after this rep was added.
    pub count: u64,
    /// Timestamp of the sample that completed the rep.
    pub timestamp_ms: u64,
    /// Timestamp of the rotation trough that anchored the rep, if the
    /// detection mode anchors on one.
    pub trough_ms: Option<u64>,
    /// Timestamps of the gravity peaks that confirmed the rep, in
    /// `Channel::GRAVITY` order.
    pub peaks_ms: [u64; 3],
}
