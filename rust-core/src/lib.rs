//! Rep Sensing Engine Library
//!
//! A real-time repetition counter that watches a live motion sensor stream
//! (rotation rate about Y plus the three gravity components) and counts
//! lateral-raise reps, once per completed gesture cycle.
//!
//! # Design Philosophy
//!
//! - **One owner of mutable state**: [`RepCounter`] holds the buffers, latch,
//!   and count. Every other stage is a pure function over slices.
//! - **Fail-loud input handling**: malformed readings are rejected with an
//!   error, never silently buffered.
//! - **Tunable, not hardcoded**: every detection constant lives in
//!   [`RepCounterConfig`].
//! - **Observation, not output**: the engine signals a rep through callbacks;
//!   haptics, UI and device sync live outside it.
//!
//! # Example
//!
//! ```
//! use rep_sensing::{MotionSample, RepCounter, RepCounterConfig};
//!
//! let mut counter = RepCounter::new(RepCounterConfig::default()).unwrap();
//! counter.on_rep(|event| println!("rep #{}", event.count));
//!
//! let reading = MotionSample::new(0, 0.0, [0.0, 0.0, -1.0]);
//! assert_eq!(counter.ingest(&reading).unwrap(), None);
//! assert_eq!(counter.count(), 0);
//! ```

pub mod buffer;
pub mod correlation;
pub mod error;
pub mod features;
pub mod ffi;
pub mod latch;
pub mod pipeline;
pub mod signal;
pub mod types;

#[cfg(test)]
mod integration_tests;

// Re-export commonly used types
pub use error::{SensingError, SensingResult};
pub use latch::{DebouncePolicy, LatchState};
pub use pipeline::{ChannelThresholds, DetectionMode, RepCounter, RepCounterConfig, SharedRepCounter};
pub use signal::ThresholdRule;
pub use types::{Channel, MotionSample, RepEvent, Sample};
