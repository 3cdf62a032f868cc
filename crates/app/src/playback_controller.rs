//! Playback controller: plays catalog tracks on the single audio channel.
//!
//! Same shape as the fan controller, but there is no countdown: a track ends
//! when the engine stops reporting busy, which the loop polls once per tick.

use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use aroma_domain::error::{AromaError, HardwareError};
use aroma_domain::id::TrackId;
use aroma_domain::playback::{PlaybackCommand, PlaybackState, PlaybackStatus, TrackCatalog};

use crate::control_loop::{Flow, LoopHandle, LoopTiming, lock};
use crate::ports::{AudioEngine, EventPublisher};

struct Shared<E, P> {
    engine: E,
    catalog: TrackCatalog,
    publisher: P,
    timing: LoopTiming,
    state: Mutex<PlaybackState>,
    queue: tokio::sync::Mutex<mpsc::UnboundedReceiver<PlaybackCommand>>,
}

/// Controls the music channel.
pub struct PlaybackController<E, P> {
    shared: Arc<Shared<E, P>>,
    commands: mpsc::UnboundedSender<PlaybackCommand>,
    running: Mutex<Option<LoopHandle>>,
}

impl<E, P> PlaybackController<E, P>
where
    E: AudioEngine + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    /// Create a stopped controller. The engine is owned by the controller
    /// from here on.
    ///
    /// Only `timing.tick` is used: engine failures are logged per command and
    /// never stall the loop, so there is nothing to back off from.
    pub fn new(engine: E, catalog: TrackCatalog, publisher: P, timing: LoopTiming) -> Self {
        let (commands, queue) = mpsc::unbounded_channel();
        Self {
            shared: Arc::new(Shared {
                engine,
                catalog,
                publisher,
                timing,
                state: Mutex::new(PlaybackState::default()),
                queue: tokio::sync::Mutex::new(queue),
            }),
            commands,
            running: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn catalog(&self) -> &TrackCatalog {
        &self.shared.catalog
    }

    /// Queue `track_id` to be played, interrupting the current track.
    ///
    /// # Errors
    ///
    /// Returns [`AromaError::InvalidArgument`] when the track is not in the
    /// catalog; nothing is queued in that case.
    pub fn start_track(&self, track_id: &str) -> Result<(), AromaError> {
        let track_id = self.shared.catalog.resolve(track_id)?;
        self.submit(PlaybackCommand::Start { track_id });
        Ok(())
    }

    /// Queue a stop. Always accepted.
    pub fn stop_playback(&self) {
        self.submit(PlaybackCommand::Stop);
    }

    #[must_use]
    pub fn status(&self) -> PlaybackStatus {
        lock(&self.shared.state).status()
    }

    /// Reset to idle and spawn the loop. No-op when already running.
    pub fn start(&self) {
        let mut running = lock(&self.running);
        if running.is_some() {
            return;
        }
        *lock(&self.shared.state) = PlaybackState::default();

        let shared = Arc::clone(&self.shared);
        *running = Some(LoopHandle::spawn(move |cancel| shared.run(cancel)));
        tracing::info!("started music management");
    }

    /// Stop the loop, then stop playback and shut the engine down.
    ///
    /// Safe to call before [`start`](Self::start) and more than once.
    pub async fn stop(&self) {
        let handle = lock(&self.running).take();
        if let Some(handle) = handle {
            if let Err(err) = handle.shutdown().await {
                tracing::error!(%err, "music loop terminated abnormally");
            }
            tracing::info!("stopped music management");
        }

        {
            let mut state = lock(&self.shared.state);
            if let Err(err) = self.shared.engine.stop() {
                tracing::error!(%err, "failed to stop music during cleanup");
            }
            state.current_track = None;
        }
        if let Err(err) = self.shared.engine.release() {
            tracing::error!(%err, "failed to release audio engine");
        }
    }

    fn submit(&self, command: PlaybackCommand) {
        if let Err(err) = self.commands.send(command) {
            tracing::error!(command = ?err.0, "music command queue closed");
        }
    }
}

impl<E, P> Shared<E, P>
where
    E: AudioEngine,
    P: EventPublisher,
{
    async fn run(self: Arc<Self>, cancel: CancellationToken) {
        let mut queue = self.queue.lock().await;
        while self.iterate(&mut queue, &cancel).await == Flow::Continue {}
        tracing::debug!("music loop exited");
    }

    async fn iterate(
        &self,
        queue: &mut mpsc::UnboundedReceiver<PlaybackCommand>,
        cancel: &CancellationToken,
    ) -> Flow {
        while let Ok(command) = queue.try_recv() {
            self.apply(command);
        }

        let status = self.reconcile();
        self.publisher.publish(status.into());

        let next = tokio::select! {
            biased;
            () = cancel.cancelled() => return Flow::Exit,
            next = tokio::time::timeout(self.timing.tick, queue.recv()) => next,
        };
        match next {
            Ok(Some(command)) => self.apply(command),
            Ok(None) => return Flow::Exit,
            Err(_elapsed) => {}
        }
        Flow::Continue
    }

    /// Driver failures leave `current_track` untouched; the completion check
    /// clears it once the engine reports idle.
    fn apply(&self, command: PlaybackCommand) {
        let mut state = lock(&self.state);
        match command {
            PlaybackCommand::Start { track_id } => match self.play(&track_id) {
                Ok(()) => {
                    tracing::info!(
                        track = %track_id,
                        file = self.catalog.file_name(&track_id).unwrap_or_default(),
                        "started playing"
                    );
                    state.current_track = Some(track_id);
                }
                Err(err) => tracing::error!(track = %track_id, %err, "error playing track"),
            },
            PlaybackCommand::Stop => match self.engine.stop() {
                Ok(()) => {
                    state.current_track = None;
                    tracing::info!("music stopped");
                }
                Err(err) => tracing::error!(%err, "error stopping music"),
            },
        }
    }

    fn play(&self, track_id: &TrackId) -> Result<(), HardwareError> {
        let path = self
            .catalog
            .path_for(track_id)
            .ok_or_else(|| HardwareError::Audio(format!("no file for track {track_id}")))?;
        // A track that cannot be loaded must not cut off the one playing.
        self.engine.load(&path)?;
        self.engine.stop()?;
        self.engine.play()
    }

    /// Clear the current track once the engine has gone quiet on its own.
    fn reconcile(&self) -> PlaybackStatus {
        let mut state = lock(&self.state);
        if state.current_track.is_some() && !self.engine.is_busy() {
            if let Some(track_id) = state.current_track.take() {
                tracing::info!(track = %track_id, "music finished playing");
            }
        }
        state.status()
    }
}
