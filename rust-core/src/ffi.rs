//! C FFI Bindings for Native Host Integration
//!
//! This module exposes the rep counter to watch and phone apps via C ABI.
//! The host motion callback forwards each reading to `rep_process_sample()`
//! and registers a rep callback to drive haptic or visual feedback.
//!
//! Memory Safety:
//! - The engine instance must be freed with `rep_engine_destroy()`
//! - NULL checks are performed on all inputs
//!
//! Thread Safety:
//! - The engine is NOT thread-safe. Use a single thread or mutex.

use std::os::raw::{c_char, c_void};
use std::ptr;

use crate::latch::DebouncePolicy;
use crate::pipeline::{DetectionMode, RepCounter, RepCounterConfig};
use crate::types::MotionSample;

// ============================================================================
// OPAQUE HANDLE TYPES
// ============================================================================

/// Callback invoked once per counted rep with the new count and timestamp.
pub type RepCallback = Option<unsafe extern "C" fn(user_data: *mut c_void, count: u64, timestamp_ms: u64)>;

/// Opaque handle to the rep counting engine.
pub struct RepEngine {
    counter: RepCounter,
    callback: RepCallback,
    user_data: *mut c_void,
}

/// Result status codes.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepStatus {
    /// Operation succeeded.
    Ok = 0,
    /// Null pointer provided.
    NullPointer = 1,
    /// Invalid parameter value.
    InvalidParameter = 2,
    /// Sample was rejected (non-finite value or out-of-order timestamp).
    RejectedSample = 3,
    /// Internal error.
    InternalError = 4,
}

/// Configuration for the engine.
///
/// Zero values select the built-in default for that field.
#[repr(C)]
#[derive(Debug, Clone)]
pub struct RepEngineConfig {
    /// Samples kept per channel (default 100).
    pub window_capacity: u32,
    /// Moving-average width (default 5).
    pub smoothing_window: u32,
    /// Debounce tolerance in ms (default 500).
    pub debounce_ms: u64,
    /// Trough/peak correlation tolerance in ms (default 500).
    pub correlation_tolerance_ms: u64,
    /// Use raw fixed-threshold detection instead of refined.
    pub raw_mode: i32,
    /// Release the latch as soon as the condition drops.
    pub release_immediately: i32,
}

impl RepEngineConfig {
    fn to_config(&self) -> RepCounterConfig {
        let mut config = if self.raw_mode != 0 {
            RepCounterConfig::raw()
        } else {
            RepCounterConfig::default()
        };
        if self.window_capacity > 0 {
            config.window_capacity = self.window_capacity as usize;
        }
        if self.smoothing_window > 0 {
            config.smoothing_window = self.smoothing_window as usize;
        }
        if self.debounce_ms > 0 {
            config.debounce_ms = self.debounce_ms;
        }
        if self.correlation_tolerance_ms > 0 {
            config.correlation_tolerance_ms = self.correlation_tolerance_ms;
        }
        if self.release_immediately != 0 {
            config.debounce_policy = DebouncePolicy::ReleaseImmediately;
        }
        config
    }
}

// ============================================================================
// ENGINE LIFECYCLE
// ============================================================================

/// Create a new rep engine instance.
///
/// # Safety
/// - `config` must be NULL or a valid pointer to RepEngineConfig.
/// - The returned pointer must be freed with `rep_engine_destroy()`.
///
/// # Returns
/// - Pointer to RepEngine on success (NULL config selects all defaults).
/// - NULL if the configuration is invalid.
#[no_mangle]
pub unsafe extern "C" fn rep_engine_create(config: *const RepEngineConfig) -> *mut RepEngine {
    let config = if config.is_null() {
        RepCounterConfig::default()
    } else {
        (*config).to_config()
    };

    let counter = match RepCounter::new(config) {
        Ok(c) => c,
        Err(e) => {
            tracing::warn!("rep_engine_create rejected config: {}", e);
            return ptr::null_mut();
        }
    };

    Box::into_raw(Box::new(RepEngine {
        counter,
        callback: None,
        user_data: ptr::null_mut(),
    }))
}

/// Check a configuration without creating an engine.
///
/// # Safety
/// - `config` must be NULL or a valid pointer to RepEngineConfig.
///
/// # Returns
/// - `Ok` if `rep_engine_create()` would accept it.
/// - `InvalidParameter` if a field is out of range.
#[no_mangle]
pub unsafe extern "C" fn rep_validate_config(config: *const RepEngineConfig) -> RepStatus {
    if config.is_null() {
        return RepStatus::NullPointer;
    }

    match (*config).to_config().validate() {
        Ok(()) => RepStatus::Ok,
        Err(e) => {
            tracing::debug!("rep_validate_config: {}", e);
            RepStatus::InvalidParameter
        }
    }
}

/// Destroy a rep engine instance.
///
/// # Safety
/// - `engine` must be a valid pointer from `rep_engine_create()`.
/// - Must not be called more than once for the same pointer.
#[no_mangle]
pub unsafe extern "C" fn rep_engine_destroy(engine: *mut RepEngine) {
    if !engine.is_null() {
        drop(Box::from_raw(engine));
    }
}

/// Zero the rep count and release the latch. Buffered history is kept.
///
/// # Safety
/// - `engine` must be a valid pointer.
#[no_mangle]
pub unsafe extern "C" fn rep_engine_reset(engine: *mut RepEngine) -> RepStatus {
    if engine.is_null() {
        return RepStatus::NullPointer;
    }

    let engine = &mut *engine;
    engine.counter.reset();

    RepStatus::Ok
}

/// Register the rep callback. Pass NULL to clear it.
///
/// # Safety
/// - `engine` must be a valid pointer.
/// - `user_data` is passed back verbatim and must outlive the registration.
#[no_mangle]
pub unsafe extern "C" fn rep_set_callback(
    engine: *mut RepEngine,
    callback: RepCallback,
    user_data: *mut c_void,
) -> RepStatus {
    if engine.is_null() {
        return RepStatus::NullPointer;
    }

    let engine = &mut *engine;
    engine.callback = callback;
    engine.user_data = user_data;

    RepStatus::Ok
}

// ============================================================================
// SAMPLE PROCESSING
// ============================================================================

/// Process a single motion reading.
///
/// # Safety
/// - `engine` must be a valid pointer.
/// - `rep_detected` must be NULL or a valid pointer; it receives 1 when this
///   reading completed a rep, 0 otherwise.
///
/// # Parameters
/// - `timestamp_ms`: Monotonic sample timestamp in milliseconds.
/// - `rotation_y`: Rotation rate about Y in rad/s.
/// - `gravity_x/y/z`: Gravity vector components in g.
#[no_mangle]
pub unsafe extern "C" fn rep_process_sample(
    engine: *mut RepEngine,
    timestamp_ms: u64,
    rotation_y: f64,
    gravity_x: f64, gravity_y: f64, gravity_z: f64,
    rep_detected: *mut i32,
) -> RepStatus {
    if engine.is_null() {
        return RepStatus::NullPointer;
    }

    let engine = &mut *engine;
    let sample = MotionSample::new(timestamp_ms, rotation_y, [gravity_x, gravity_y, gravity_z]);

    let (status, detected) = match engine.counter.ingest(&sample) {
        Ok(Some(event)) => {
            if let Some(cb) = engine.callback {
                cb(engine.user_data, event.count, event.timestamp_ms);
            }
            (RepStatus::Ok, 1)
        }
        Ok(None) => (RepStatus::Ok, 0),
        Err(e) if e.is_rejected_sample() => (RepStatus::RejectedSample, 0),
        Err(_) => (RepStatus::InternalError, 0),
    };

    if !rep_detected.is_null() {
        *rep_detected = detected;
    }

    status
}

// ============================================================================
// STATUS QUERIES
// ============================================================================

/// Get the current rep count.
#[no_mangle]
pub unsafe extern "C" fn rep_get_count(engine: *const RepEngine) -> i64 {
    if engine.is_null() {
        return -1;
    }

    let engine = &*engine;
    engine.counter.count() as i64
}

/// Get the detection mode (0 = raw, 1 = refined).
#[no_mangle]
pub unsafe extern "C" fn rep_get_mode(engine: *const RepEngine) -> i32 {
    if engine.is_null() {
        return -1;
    }

    let engine = &*engine;
    match engine.counter.config().mode {
        DetectionMode::Raw => 0,
        DetectionMode::Refined => 1,
    }
}

// ============================================================================
// VERSION INFO
// ============================================================================

/// Get the library version string.
///
/// # Returns
/// - Static string, do NOT free.
#[no_mangle]
pub extern "C" fn rep_version() -> *const c_char {
    static VERSION: &[u8] = concat!("rep-sensing/", env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}

// ============================================================================
// TESTS
// ============================================================================
