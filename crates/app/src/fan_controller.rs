//! Fan controller: owns one fan's countdown, command queue and loop.
//!
//! Commands are queued by [`FanController::activate`] /
//! [`FanController::deactivate`] and applied by the loop, at most one tick
//! later. Every iteration of the loop:
//!
//! 1. applies every queued command,
//! 2. drives the output high or low if the countdown requires it,
//! 3. publishes a [`FanStatus`] snapshot,
//! 4. waits up to one tick for the next command. A command that arrives is
//!    applied right away and the countdown is not decremented for that
//!    window; a timeout decrements it by one second.

use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use aroma_domain::error::{AromaError, HardwareError};
use aroma_domain::fan::{FanCommand, FanState, FanStatus, Transition};
use aroma_domain::id::{FanId, GpioPin};

use crate::control_loop::{Flow, LoopHandle, LoopTiming, lock};
use crate::ports::{EventPublisher, OutputDriver};

struct Shared<D, P> {
    fan_id: FanId,
    pin: GpioPin,
    driver: D,
    publisher: P,
    timing: LoopTiming,
    state: Mutex<FanState>,
    /// Held by the loop for as long as it runs.
    queue: tokio::sync::Mutex<mpsc::UnboundedReceiver<FanCommand>>,
}

/// Controls one fan relay.
pub struct FanController<D, P> {
    shared: Arc<Shared<D, P>>,
    commands: mpsc::UnboundedSender<FanCommand>,
    running: Mutex<Option<LoopHandle>>,
}

impl<D, P> FanController<D, P>
where
    D: OutputDriver + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    /// Create a stopped controller for `fan_id`, wired to `pin`.
    pub fn new(fan_id: FanId, pin: GpioPin, driver: D, publisher: P, timing: LoopTiming) -> Self {
        let (commands, queue) = mpsc::unbounded_channel();
        Self {
            shared: Arc::new(Shared {
                fan_id,
                pin,
                driver,
                publisher,
                timing,
                state: Mutex::new(FanState::default()),
                queue: tokio::sync::Mutex::new(queue),
            }),
            commands,
            running: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn fan_id(&self) -> FanId {
        self.shared.fan_id
    }

    #[must_use]
    pub fn pin(&self) -> GpioPin {
        self.shared.pin
    }

    /// Queue a run of `duration_seconds`, replacing any remaining time.
    ///
    /// # Errors
    ///
    /// Returns [`AromaError::InvalidArgument`] when `duration_seconds` is not
    /// strictly positive.
    pub fn activate(&self, duration_seconds: i64) -> Result<(), AromaError> {
        let command = FanCommand::activate(duration_seconds)?;
        self.submit(command);
        Ok(())
    }

    /// Queue a stop. Always accepted.
    pub fn deactivate(&self) {
        self.submit(FanCommand::Deactivate);
    }

    /// Latest committed snapshot.
    #[must_use]
    pub fn status(&self) -> FanStatus {
        lock(&self.shared.state).status(self.shared.fan_id)
    }

    /// Drive the output low, reset the countdown and spawn the loop.
    /// Calling it again while running does nothing.
    ///
    /// # Errors
    ///
    /// Returns [`AromaError::Hardware`] when the output cannot be initialised;
    /// the loop is not started in that case.
    pub fn start(&self) -> Result<(), AromaError> {
        let mut running = lock(&self.running);
        if running.is_some() {
            return Ok(());
        }

        self.shared.driver.set_output(self.shared.pin, false)?;
        *lock(&self.shared.state) = FanState::default();

        let shared = Arc::clone(&self.shared);
        *running = Some(LoopHandle::spawn(move |cancel| shared.run(cancel)));
        tracing::info!(fan_id = %self.shared.fan_id, pin = %self.shared.pin, "started fan control");
        Ok(())
    }

    /// Stop the loop, then force the output low and release the pin.
    ///
    /// Safe to call before [`start`](Self::start) and more than once.
    /// Teardown failures are logged, never returned.
    pub async fn stop(&self) {
        let fan_id = self.shared.fan_id;
        let pin = self.shared.pin;

        let handle = lock(&self.running).take();
        if let Some(handle) = handle {
            if let Err(err) = handle.shutdown().await {
                tracing::error!(%fan_id, %err, "fan loop terminated abnormally");
            }
            tracing::info!(%fan_id, "stopped fan control");
        }

        {
            let mut state = lock(&self.shared.state);
            match self.shared.driver.set_output(pin, false) {
                Ok(()) => state.mark_energized(false),
                Err(err) => tracing::error!(%fan_id, %pin, %err, "failed to turn fan off during cleanup"),
            }
            state.apply(FanCommand::Deactivate);
        }

        if let Err(err) = self.shared.driver.release_output(pin) {
            tracing::error!(%fan_id, %pin, %err, "failed to release fan output");
        }
    }

    fn submit(&self, command: FanCommand) {
        if self.commands.send(command).is_err() {
            tracing::error!(fan_id = %self.shared.fan_id, ?command, "fan command queue closed");
        }
    }
}

impl<D, P> Shared<D, P>
where
    D: OutputDriver,
    P: EventPublisher,
{
    async fn run(self: Arc<Self>, cancel: CancellationToken) {
        let mut queue = self.queue.lock().await;
        loop {
            match self.iterate(&mut queue, &cancel).await {
                Ok(Flow::Continue) => {}
                Ok(Flow::Exit) => break,
                Err(err) => {
                    tracing::error!(fan_id = %self.fan_id, %err, "error in fan loop");
                    tokio::select! {
                        () = cancel.cancelled() => break,
                        () = tokio::time::sleep(self.timing.backoff) => {}
                    }
                }
            }
        }
        tracing::debug!(fan_id = %self.fan_id, "fan loop exited");
    }

    async fn iterate(
        &self,
        queue: &mut mpsc::UnboundedReceiver<FanCommand>,
        cancel: &CancellationToken,
    ) -> Result<Flow, HardwareError> {
        while let Ok(command) = queue.try_recv() {
            self.apply(command);
        }

        let status = self.reconcile()?;
        self.publisher.publish(status.into());

        let next = tokio::select! {
            biased;
            () = cancel.cancelled() => return Ok(Flow::Exit),
            next = tokio::time::timeout(self.timing.tick, queue.recv()) => next,
        };
        match next {
            Ok(Some(command)) => self.apply(command),
            Ok(None) => return Ok(Flow::Exit),
            Err(_elapsed) => lock(&self.state).elapse_second(),
        }
        Ok(Flow::Continue)
    }

    fn apply(&self, command: FanCommand) {
        lock(&self.state).apply(command);
        tracing::debug!(fan_id = %self.fan_id, ?command, "applied fan command");
    }

    /// Bring the output in line with the countdown, under the state lock.
    fn reconcile(&self) -> Result<FanStatus, HardwareError> {
        let mut state = lock(&self.state);
        match state.transition() {
            Some(Transition::Energize) => {
                self.driver.set_output(self.pin, true)?;
                state.mark_energized(true);
                tracing::info!(fan_id = %self.fan_id, pin = %self.pin, "turned on fan");
            }
            Some(Transition::DeEnergize) => {
                self.driver.set_output(self.pin, false)?;
                state.mark_energized(false);
                tracing::info!(fan_id = %self.fan_id, pin = %self.pin, "turned off fan");
            }
            None => {}
        }
        Ok(state.status(self.fan_id))
    }
}
