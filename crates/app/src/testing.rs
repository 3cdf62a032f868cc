//! In-memory doubles for the ports, shared by the unit tests of this crate.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc;

use aroma_domain::error::HardwareError;
use aroma_domain::event::Event;
use aroma_domain::fan::FanStatus;
use aroma_domain::id::{FanId, GpioPin};
use aroma_domain::playback::PlaybackStatus;

use crate::ports::{AudioEngine, EventPublisher, OutputDriver};

/// Forwards every published event into a channel the test reads from.
#[derive(Clone)]
pub struct ChannelPublisher {
    tx: mpsc::UnboundedSender<Event>,
}

impl ChannelPublisher {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Event>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl EventPublisher for ChannelPublisher {
    fn publish(&self, event: Event) {
        let _ = self.tx.send(event);
    }
}

async fn next_event(rx: &mut mpsc::UnboundedReceiver<Event>) -> Event {
    tokio::time::timeout(Duration::from_secs(30), rx.recv())
        .await
        .expect("a snapshot should be published")
        .expect("publisher should stay alive")
}

/// Next fan snapshot published for `fan_id`, skipping everything else.
pub async fn next_fan_status(rx: &mut mpsc::UnboundedReceiver<Event>, fan_id: FanId) -> FanStatus {
    loop {
        if let Event::FanStatus(status) = next_event(rx).await {
            if status.fan_id == fan_id {
                return status;
            }
        }
    }
}

/// Next playback snapshot, skipping everything else.
pub async fn next_playback_status(rx: &mut mpsc::UnboundedReceiver<Event>) -> PlaybackStatus {
    loop {
        if let Event::PlaybackStatus(status) = next_event(rx).await {
            return status;
        }
    }
}

/// Output driver that records every successful call.
#[derive(Default)]
pub struct RecordingDriver {
    levels: Mutex<Vec<(GpioPin, bool)>>,
    released: Mutex<Vec<GpioPin>>,
    released_all: AtomicUsize,
    failing_energize: AtomicUsize,
}

impl RecordingDriver {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Make the next `count` attempts to drive a pin high fail.
    pub fn fail_next_energize(&self, count: usize) {
        self.failing_energize.store(count, Ordering::SeqCst);
    }

    pub fn levels(&self) -> Vec<(GpioPin, bool)> {
        self.levels.lock().unwrap().clone()
    }

    pub fn levels_for(&self, pin: GpioPin) -> Vec<bool> {
        self.levels()
            .into_iter()
            .filter(|(p, _)| *p == pin)
            .map(|(_, high)| high)
            .collect()
    }

    pub fn released(&self) -> Vec<GpioPin> {
        self.released.lock().unwrap().clone()
    }

    pub fn released_all(&self) -> usize {
        self.released_all.load(Ordering::SeqCst)
    }
}

impl OutputDriver for RecordingDriver {
    fn set_output(&self, pin: GpioPin, high: bool) -> Result<(), HardwareError> {
        if high
            && self
                .failing_energize
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
        {
            return Err(HardwareError::Output {
                pin,
                reason: "injected failure".to_string(),
            });
        }
        self.levels.lock().unwrap().push((pin, high));
        Ok(())
    }

    fn release_output(&self, pin: GpioPin) -> Result<(), HardwareError> {
        self.released.lock().unwrap().push(pin);
        Ok(())
    }

    fn release_all_outputs(&self) -> Result<(), HardwareError> {
        self.released_all.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Calls received by a [`ScriptedEngine`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCall {
    Load(PathBuf),
    Play,
    Stop,
    Release,
}

/// Audio engine whose busy flag is controlled by the test.
#[derive(Default)]
pub struct ScriptedEngine {
    busy: AtomicBool,
    fail_load: AtomicBool,
    calls: Mutex<Vec<EngineCall>>,
}

impl ScriptedEngine {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Simulate the track running out on its own.
    pub fn finish(&self) {
        self.busy.store(false, Ordering::SeqCst);
    }

    pub fn fail_loads(&self) {
        self.fail_load.store(true, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<EngineCall> {
        self.calls.lock().unwrap().clone()
    }
}

impl AudioEngine for ScriptedEngine {
    fn load(&self, path: &Path) -> Result<(), HardwareError> {
        if self.fail_load.load(Ordering::SeqCst) {
            return Err(HardwareError::Audio(format!(
                "cannot open {}",
                path.display()
            )));
        }
        self.calls
            .lock()
            .unwrap()
            .push(EngineCall::Load(path.to_path_buf()));
        Ok(())
    }

    fn play(&self) -> Result<(), HardwareError> {
        self.calls.lock().unwrap().push(EngineCall::Play);
        self.busy.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn stop(&self) -> Result<(), HardwareError> {
        self.calls.lock().unwrap().push(EngineCall::Stop);
        self.busy.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    fn release(&self) -> Result<(), HardwareError> {
        self.calls.lock().unwrap().push(EngineCall::Release);
        Ok(())
    }
}
