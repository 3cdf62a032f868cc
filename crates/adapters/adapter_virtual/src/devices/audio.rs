//! Virtual audio engine.

use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use tokio::time::Instant;

use aroma_app::ports::AudioEngine;
use aroma_domain::error::HardwareError;

use super::lock;

#[derive(Debug, Default)]
struct Channel {
    loaded: Option<PathBuf>,
    started_at: Option<Instant>,
}

/// Audio engine that "plays" a loaded file for a fixed length of time.
///
/// `load` only checks that the file exists; its contents are never decoded.
#[derive(Debug)]
pub struct VirtualAudioEngine {
    track_length: Duration,
    channel: Mutex<Channel>,
}

impl Default for VirtualAudioEngine {
    fn default() -> Self {
        Self::new(Duration::from_secs(180))
    }
}

impl VirtualAudioEngine {
    #[must_use]
    pub fn new(track_length: Duration) -> Self {
        Self {
            track_length,
            channel: Mutex::new(Channel::default()),
        }
    }

    /// File most recently loaded.
    #[must_use]
    pub fn loaded(&self) -> Option<PathBuf> {
        lock(&self.channel).loaded.clone()
    }
}

impl AudioEngine for VirtualAudioEngine {
    fn load(&self, path: &Path) -> Result<(), HardwareError> {
        if !path.is_file() {
            return Err(HardwareError::Audio(format!(
                "file not found: {}",
                path.display()
            )));
        }
        lock(&self.channel).loaded = Some(path.to_path_buf());
        tracing::debug!(path = %path.display(), "virtual track loaded");
        Ok(())
    }

    fn play(&self) -> Result<(), HardwareError> {
        let mut channel = lock(&self.channel);
        if channel.loaded.is_none() {
            return Err(HardwareError::Audio("no track loaded".to_string()));
        }
        channel.started_at = Some(Instant::now());
        Ok(())
    }

    fn stop(&self) -> Result<(), HardwareError> {
        lock(&self.channel).started_at = None;
        Ok(())
    }

    fn is_busy(&self) -> bool {
        lock(&self.channel)
            .started_at
            .is_some_and(|started| started.elapsed() < self.track_length)
    }

    fn release(&self) -> Result<(), HardwareError> {
        *lock(&self.channel) = Channel::default();
        Ok(())
    }
}
