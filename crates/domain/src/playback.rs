//! Playback: a single audio channel playing one catalog track at a time.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::id::TrackId;

/// Command consumed by the playback controller loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackCommand {
    /// Stop whatever is playing and start `track_id`.
    Start { track_id: TrackId },
    /// Stop playback.
    Stop,
}

/// What the playback channel is doing right now.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaybackState {
    /// `None` means idle.
    pub current_track: Option<TrackId>,
}

impl PlaybackState {
    #[must_use]
    pub fn status(&self) -> PlaybackStatus {
        PlaybackStatus {
            current_track: self.current_track.clone(),
        }
    }
}

/// Immutable status snapshot of the playback channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackStatus {
    pub current_track: Option<TrackId>,
}

/// Known tracks and where their files live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackCatalog {
    directory: PathBuf,
    tracks: BTreeMap<TrackId, String>,
}

impl Default for TrackCatalog {
    fn default() -> Self {
        Self::new(
            "static/music",
            [
                ("1", "Tarantella_Napoletana.mp3"),
                ("2", "Mambo_Italiano.mp3"),
                ("3", "Luna_Mezzo_Mare.mp3"),
                ("4", "Thats_Amore.mp3"),
            ],
        )
    }
}

impl TrackCatalog {
    /// Build a catalog of `(track id, file name)` pairs stored under `directory`.
    pub fn new<I, K, V>(directory: impl Into<PathBuf>, tracks: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            directory: directory.into(),
            tracks: tracks
                .into_iter()
                .map(|(id, file)| (TrackId::new(id), file.into()))
                .collect(),
        }
    }

    #[must_use]
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    #[must_use]
    pub fn contains(&self, track_id: &TrackId) -> bool {
        self.tracks.contains_key(track_id)
    }

    /// Resolve a raw track id against the catalog.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::UnknownTrack`] listing the available ids.
    pub fn resolve(&self, raw: &str) -> Result<TrackId, ValidationError> {
        let track_id = TrackId::new(raw);
        if self.contains(&track_id) {
            Ok(track_id)
        } else {
            Err(ValidationError::UnknownTrack {
                track_id: raw.to_string(),
                available: self.ids().map(ToString::to_string).collect(),
            })
        }
    }

    /// Full path of the file backing `track_id`.
    #[must_use]
    pub fn path_for(&self, track_id: &TrackId) -> Option<PathBuf> {
        self.tracks.get(track_id).map(|file| self.directory.join(file))
    }

    /// File name backing `track_id`.
    #[must_use]
    pub fn file_name(&self, track_id: &TrackId) -> Option<&str> {
        self.tracks.get(track_id).map(String::as_str)
    }

    pub fn ids(&self) -> impl Iterator<Item = &TrackId> {
        self.tracks.keys()
    }
}
