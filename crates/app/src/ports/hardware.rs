//! Hardware ports: the opaque driver calls the controllers rely on.
//!
//! The control loops never look past these calls. Real GPIO and audio
//! backends, as well as the simulated ones in `aroma-adapter-virtual`,
//! implement them.

use std::path::Path;

use aroma_domain::error::HardwareError;
use aroma_domain::id::GpioPin;

/// Digital output lines driving the fan relays.
///
/// A single driver is shared by every fan controller, but each pin is only
/// ever driven by the controller that owns it.
pub trait OutputDriver: Send + Sync {
    /// Drive `pin` high (`true`) or low (`false`).
    ///
    /// # Errors
    ///
    /// Returns [`HardwareError::Output`] when the line cannot be driven.
    fn set_output(&self, pin: GpioPin, high: bool) -> Result<(), HardwareError>;

    /// Give `pin` back to the system.
    ///
    /// # Errors
    ///
    /// Returns [`HardwareError::Output`] when the line cannot be released.
    fn release_output(&self, pin: GpioPin) -> Result<(), HardwareError>;

    /// Release every line this driver ever claimed.
    ///
    /// # Errors
    ///
    /// Returns [`HardwareError::Output`] when cleanup fails.
    fn release_all_outputs(&self) -> Result<(), HardwareError>;
}

impl<T: OutputDriver + ?Sized> OutputDriver for std::sync::Arc<T> {
    fn set_output(&self, pin: GpioPin, high: bool) -> Result<(), HardwareError> {
        (**self).set_output(pin, high)
    }

    fn release_output(&self, pin: GpioPin) -> Result<(), HardwareError> {
        (**self).release_output(pin)
    }

    fn release_all_outputs(&self) -> Result<(), HardwareError> {
        (**self).release_all_outputs()
    }
}

/// A music mixer able to play one file at a time.
///
/// Every method may fail with [`HardwareError::Audio`].
#[allow(clippy::missing_errors_doc)]
pub trait AudioEngine: Send + Sync {
    /// Load `path` for the next [`play`](Self::play), replacing whatever was
    /// loaded before. Must not interrupt a track that is already playing.
    ///
    /// Fails when the file is missing or cannot be decoded.
    fn load(&self, path: &Path) -> Result<(), HardwareError>;

    /// Start playing the loaded file.
    fn play(&self) -> Result<(), HardwareError>;

    /// Stop playback. Stopping an idle engine is not an error.
    fn stop(&self) -> Result<(), HardwareError>;

    /// Whether the engine is still producing sound.
    fn is_busy(&self) -> bool;

    /// Shut the mixer down.
    fn release(&self) -> Result<(), HardwareError> {
        Ok(())
    }
}

impl<T: AudioEngine + ?Sized> AudioEngine for std::sync::Arc<T> {
    fn load(&self, path: &Path) -> Result<(), HardwareError> {
        (**self).load(path)
    }

    fn play(&self) -> Result<(), HardwareError> {
        (**self).play()
    }

    fn stop(&self) -> Result<(), HardwareError> {
        (**self).stop()
    }

    fn is_busy(&self) -> bool {
        (**self).is_busy()
    }

    fn release(&self) -> Result<(), HardwareError> {
        (**self).release()
    }
}
