//! Common error types used across the workspace.
//!
//! Each failure family has its own typed error and converts into
//! [`AromaError`] via `#[from]`. Only [`AromaError::InvalidArgument`] is ever
//! surfaced to callers of the control API; hardware and dispatch failures are
//! logged by the loops that hit them.

use crate::id::GpioPin;

/// Top-level error for the aroma workspace.
#[derive(Debug, thiserror::Error)]
pub enum AromaError {
    /// The caller supplied an argument that violates a domain invariant.
    #[error("invalid argument")]
    InvalidArgument(#[from] ValidationError),

    /// A driver call failed.
    #[error("hardware fault")]
    Hardware(#[from] HardwareError),

    /// A subscriber could not accept an event.
    #[error("dispatch failure")]
    Dispatch(#[from] DispatchError),
}

/// Rejected input, reported synchronously and never retried.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// The fan id is outside `0..count`.
    #[error("Invalid fan_id: {fan_id}. Must be 0-{max}", max = .count.saturating_sub(1))]
    FanOutOfRange { fan_id: i64, count: usize },

    /// Durations must be strictly positive.
    #[error("Duration must be positive, got: {0}")]
    NonPositiveDuration(i64),

    /// Durations must fit the countdown counter.
    #[error("Duration too long, got: {0}")]
    DurationTooLong(i64),

    /// The track id is not part of the catalog.
    #[error("Invalid track_id: {track_id}. Available tracks: {available:?}")]
    UnknownTrack {
        track_id: String,
        available: Vec<String>,
    },

    /// Two fans were wired to the same output pin.
    #[error("GPIO pin {0} is assigned to more than one fan")]
    DuplicatePin(GpioPin),

    /// A fan registry must hold exactly one controller per fan id.
    #[error("expected {expected} fan pins, got {actual}")]
    WrongFanCount { expected: usize, actual: usize },
}

/// A driver call failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HardwareError {
    /// Driving or releasing an output pin failed.
    #[error("output error on GPIO {pin}: {reason}")]
    Output { pin: GpioPin, reason: String },

    /// The audio engine rejected a call.
    #[error("audio engine error: {0}")]
    Audio(String),
}

/// A subscriber callback failed to accept an event.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DispatchError {
    /// The receiving side of the subscriber went away.
    #[error("subscriber disconnected")]
    Disconnected,

    /// The subscriber reported an error of its own.
    #[error("subscriber failed: {0}")]
    Failed(String),
}
