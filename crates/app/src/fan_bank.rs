//! Fan bank: the registry mapping every [`FanId`] to its controller.

use std::collections::HashSet;
use std::sync::Arc;

use aroma_domain::error::{AromaError, ValidationError};
use aroma_domain::fan::FanStatus;
use aroma_domain::id::{FanId, GpioPin};

use crate::control_loop::LoopTiming;
use crate::fan_controller::FanController;
use crate::ports::{EventPublisher, OutputDriver};

/// Default BCM pins of fans 0 to 3.
pub const DEFAULT_FAN_PINS: [GpioPin; FanId::COUNT] = [
    GpioPin::new(19),
    GpioPin::new(13),
    GpioPin::new(12),
    GpioPin::new(18),
];

/// One controller per fan, sharing a single output driver.
pub struct FanBank<D, P> {
    driver: Arc<D>,
    fans: Vec<FanController<Arc<D>, P>>,
}

impl<D, P> FanBank<D, P>
where
    D: OutputDriver + 'static,
    P: EventPublisher + Clone + Send + Sync + 'static,
{
    /// Wire fan `i` to `pins[i]`.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::WrongFanCount`] unless exactly
    /// [`FanId::COUNT`] pins are given, and [`ValidationError::DuplicatePin`]
    /// when two fans would share a pin.
    pub fn new(
        pins: &[GpioPin],
        driver: D,
        publisher: &P,
        timing: LoopTiming,
    ) -> Result<Self, ValidationError> {
        if pins.len() != FanId::COUNT {
            return Err(ValidationError::WrongFanCount {
                expected: FanId::COUNT,
                actual: pins.len(),
            });
        }
        let mut seen = HashSet::new();
        if let Some(pin) = pins.iter().find(|pin| !seen.insert(**pin)) {
            return Err(ValidationError::DuplicatePin(*pin));
        }

        let driver = Arc::new(driver);
        let fans = FanId::all()
            .zip(pins)
            .map(|(fan_id, pin)| {
                FanController::new(fan_id, *pin, Arc::clone(&driver), publisher.clone(), timing)
            })
            .collect();
        Ok(Self { driver, fans })
    }

    /// Look up the controller of a raw fan number.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::FanOutOfRange`] for unknown fans.
    pub fn fan(&self, fan_id: i64) -> Result<&FanController<Arc<D>, P>, ValidationError> {
        let fan_id = FanId::new(fan_id)?;
        Ok(&self.fans[fan_id.index()])
    }

    /// Run fan `fan_id` for `duration_seconds`.
    ///
    /// # Errors
    ///
    /// Returns [`AromaError::InvalidArgument`] for an unknown fan or a
    /// non-positive duration.
    pub fn activate(&self, fan_id: i64, duration_seconds: i64) -> Result<(), AromaError> {
        self.fan(fan_id)?.activate(duration_seconds)
    }

    /// Stop fan `fan_id`.
    ///
    /// # Errors
    ///
    /// Returns [`AromaError::InvalidArgument`] for an unknown fan.
    pub fn deactivate(&self, fan_id: i64) -> Result<(), AromaError> {
        self.fan(fan_id)?.deactivate();
        Ok(())
    }

    /// Snapshots of every fan, ordered by id.
    #[must_use]
    pub fn statuses(&self) -> Vec<FanStatus> {
        self.fans.iter().map(FanController::status).collect()
    }

    /// Start every fan loop.
    ///
    /// # Errors
    ///
    /// Returns the first [`AromaError::Hardware`] hit while initialising an
    /// output. Fans started before the failure keep running.
    pub fn start(&self) -> Result<(), AromaError> {
        self.fans.iter().try_for_each(FanController::start)
    }

    /// Stop every fan loop, then release all outputs.
    pub async fn stop(&self) {
        for fan in &self.fans {
            fan.stop().await;
        }
        match self.driver.release_all_outputs() {
            Ok(()) => tracing::info!("fan outputs cleaned up"),
            Err(err) => tracing::error!(%err, "failed to release fan outputs"),
        }
    }
}
