//! Fixed-capacity sample history, one buffer per channel.
//!
//! Each buffer keeps the most recent `capacity` samples in arrival order.
//! Pushing past capacity evicts the oldest sample. There are no error
//! conditions: every sample is accepted.

use std::collections::VecDeque;

use crate::types::{Channel, MotionSample, Sample};

/// Default history length (samples). At 60Hz this is about 1.7s.
pub const DEFAULT_CAPACITY: usize = 100;

/// Largest history a counter accepts (samples). About 100s at 60Hz.
pub const MAX_CAPACITY: usize = 6_000;

/// Rolling FIFO buffer of timestamped samples for a single channel.
#[derive(Debug, Clone)]
pub struct SampleBuffer {
    samples: VecDeque<Sample>,
    capacity: usize,
}

impl SampleBuffer {
    /// Create an empty buffer holding at most `capacity` samples.
    ///
    /// Only up to `MAX_CAPACITY` slots are reserved up front.
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity.min(MAX_CAPACITY) + 1),
            capacity,
        }
    }

    /// Append a sample, dropping the oldest one if the buffer is full.
    pub fn push(&mut self, sample: Sample) {
        self.samples.push_back(sample);
        if self.samples.len() > self.capacity {
            self.samples.pop_front();
        }
    }

    /// Raw values, oldest first.
    pub fn values(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.value).collect()
    }

    /// Value and timestamp pairs, oldest first.
    pub fn entries(&self) -> Vec<Sample> {
        self.samples.iter().copied().collect()
    }

    /// Timestamps only, oldest first.
    pub fn timestamps(&self) -> Vec<u64> {
        self.samples.iter().map(|s| s.timestamp_ms).collect()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Most recently pushed sample.
    pub fn latest(&self) -> Option<&Sample> {
        self.samples.back()
    }
}

/// The four channel buffers, kept in lockstep.
#[derive(Debug, Clone)]
pub struct ChannelBuffers {
    buffers: [SampleBuffer; 4],
}

impl ChannelBuffers {
    pub fn new(capacity: usize) -> Self {
        Self {
            buffers: std::array::from_fn(|_| SampleBuffer::new(capacity)),
        }
    }

    /// Fan a multi-channel reading out to every channel buffer.
    pub fn push(&mut self, sample: &MotionSample) {
        for (channel, s) in sample.channel_samples() {
            self.buffers[channel.index()].push(s);
        }
    }

    pub fn get(&self, channel: Channel) -> &SampleBuffer {
        &self.buffers[channel.index()]
    }

    /// Number of buffered readings (identical across channels).
    pub fn len(&self) -> usize {
        self.buffers[0].len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffers[0].is_empty()
    }

    /// Timestamp of the newest buffered reading.
    pub fn latest_timestamp(&self) -> Option<u64> {
        self.buffers[0].latest().map(|s| s.timestamp_ms)
    }
}
