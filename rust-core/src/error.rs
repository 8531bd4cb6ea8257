//! Error types for the repetition counting engine.

use thiserror::Error;

use crate::types::Channel;

/// Result type for engine operations.
pub type SensingResult<T> = Result<T, SensingError>;

/// Errors reported by the engine.
///
/// Failing to detect a rep is never an error. These variants cover caller
/// bugs (statistics on an empty series), malformed input, and bad config.
#[derive(Error, Debug)]
pub enum SensingError {
    /// Statistics requested on an empty series.
    #[error("statistics requested on an empty series")]
    EmptyInput,

    /// Feature scan attempted on a series too short to hold an interior point.
    #[error("insufficient data: need at least {required} samples, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    /// A reading carried NaN or an infinite value.
    #[error("non-finite value on channel {channel}")]
    NonFiniteSample { channel: Channel },

    /// A reading arrived older than the last accepted one.
    #[error("timestamp {timestamp_ms}ms precedes last accepted sample at {previous_ms}ms")]
    NonMonotonicTimestamp { previous_ms: u64, timestamp_ms: u64 },

    /// Configuration values out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration document could not be parsed.
    #[error("failed to parse configuration: {0}")]
    ConfigParse(#[from] serde_json::Error),
}

impl SensingError {
    /// True for errors caused by a single bad reading.
    ///
    /// The session can keep going after these; the reading is simply dropped.
    pub fn is_rejected_sample(&self) -> bool {
        matches!(
            self,
            SensingError::NonFiniteSample { .. } | SensingError::NonMonotonicTimestamp { .. }
        )
    }
}
