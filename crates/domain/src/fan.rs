//! Fan: a relay-driven fan that runs for a requested number of seconds.
//!
//! [`FanState`] is the countdown state machine owned by one controller.
//! It never touches hardware itself: [`FanState::transition`] tells the
//! caller which way the output must be driven, and the caller commits the
//! new level with [`FanState::mark_energized`] once the driver call succeeded.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::id::FanId;

/// Command consumed by a fan controller loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FanCommand {
    /// Run for `duration_seconds`, replacing any remaining time.
    Activate { duration_seconds: u32 },
    /// Stop at the next tick. `total_seconds` is kept for display.
    Deactivate,
}

impl FanCommand {
    /// Build an activation command from an untrusted duration.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::NonPositiveDuration`] when
    /// `duration_seconds <= 0`, or [`ValidationError::DurationTooLong`] when it
    /// does not fit the countdown counter.
    pub fn activate(duration_seconds: i64) -> Result<Self, ValidationError> {
        if duration_seconds <= 0 {
            return Err(ValidationError::NonPositiveDuration(duration_seconds));
        }
        let duration_seconds = u32::try_from(duration_seconds)
            .map_err(|_| ValidationError::DurationTooLong(duration_seconds))?;
        Ok(Self::Activate { duration_seconds })
    }
}

/// Output level change required to reconcile the state with its countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Energize,
    DeEnergize,
}

/// Countdown state of one fan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FanState {
    pub remaining_seconds: u32,
    pub total_seconds: u32,
    pub energized: bool,
}

impl FanState {
    /// Apply a command. Has no effect on `energized`.
    pub fn apply(&mut self, command: FanCommand) {
        match command {
            FanCommand::Activate { duration_seconds } => {
                self.remaining_seconds = duration_seconds;
                self.total_seconds = duration_seconds;
            }
            FanCommand::Deactivate => self.remaining_seconds = 0,
        }
    }

    /// The output change needed at this tick boundary, if any.
    #[must_use]
    pub fn transition(&self) -> Option<Transition> {
        match (self.energized, self.remaining_seconds > 0) {
            (false, true) => Some(Transition::Energize),
            (true, false) => Some(Transition::DeEnergize),
            _ => None,
        }
    }

    /// Record the output level after a successful driver call.
    pub fn mark_energized(&mut self, energized: bool) {
        self.energized = energized;
    }

    /// One second elapsed without a command.
    pub fn elapse_second(&mut self) {
        self.remaining_seconds = self.remaining_seconds.saturating_sub(1);
    }

    /// Snapshot published to observers.
    #[must_use]
    pub fn status(&self, fan_id: FanId) -> FanStatus {
        FanStatus {
            fan_id,
            remaining_seconds: self.remaining_seconds,
            total_seconds: self.total_seconds,
        }
    }
}

/// Immutable status snapshot of one fan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FanStatus {
    pub fan_id: FanId,
    pub remaining_seconds: u32,
    pub total_seconds: u32,
}
