//! Virtual output pins.

use std::collections::BTreeMap;
use std::sync::Mutex;

use aroma_app::ports::OutputDriver;
use aroma_domain::error::HardwareError;
use aroma_domain::id::GpioPin;

use super::lock;

/// Output driver that keeps pin levels in memory.
///
/// A pin is claimed on its first `set_output` and forgotten again when it
/// is released.
#[derive(Debug, Default)]
pub struct VirtualOutputDriver {
    pins: Mutex<BTreeMap<GpioPin, bool>>,
}

impl VirtualOutputDriver {
    /// Current level of `pin`, or `None` when the pin is not claimed.
    #[must_use]
    pub fn level(&self, pin: GpioPin) -> Option<bool> {
        lock(&self.pins).get(&pin).copied()
    }

    /// Pins currently claimed, in ascending order.
    #[must_use]
    pub fn claimed(&self) -> Vec<GpioPin> {
        lock(&self.pins).keys().copied().collect()
    }
}

impl OutputDriver for VirtualOutputDriver {
    fn set_output(&self, pin: GpioPin, high: bool) -> Result<(), HardwareError> {
        let previous = lock(&self.pins).insert(pin, high);
        if previous != Some(high) {
            tracing::debug!(%pin, high, "virtual output changed");
        }
        Ok(())
    }

    fn release_output(&self, pin: GpioPin) -> Result<(), HardwareError> {
        lock(&self.pins).remove(&pin);
        Ok(())
    }

    fn release_all_outputs(&self) -> Result<(), HardwareError> {
        let mut pins = lock(&self.pins);
        tracing::debug!(count = pins.len(), "releasing virtual outputs");
        pins.clear();
        Ok(())
    }
}
