//! Configuration loading: TOML file with environment variable overrides.
//!
//! Looks for `aroma.toml` in the working directory. Every field has a
//! sensible default so the file is optional. Environment variables take
//! precedence over file values.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use aroma_app::control_loop::LoopTiming;
use aroma_domain::id::{FanId, GpioPin};
use aroma_domain::playback::TrackCatalog;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Fan wiring.
    pub fans: FansConfig,
    /// Track catalog.
    pub music: MusicConfig,
    /// Loop cadence and queueing.
    pub control: ControlConfig,
    /// Static web assets.
    pub assets: AssetsConfig,
    /// Behaviour of the virtual drivers.
    pub simulation: SimulationConfig,
}

/// HTTP listener configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to (e.g. `0.0.0.0`).
    pub host: String,
    /// TCP port.
    pub port: u16,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
    /// Log file written next to the console output, rotated daily.
    /// An empty path disables it.
    pub file: PathBuf,
    /// Rotated files kept on disk.
    pub keep_files: usize,
}

/// Output pins of fans 0 to 3, as BCM numbers.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct FansConfig {
    pub pins: Vec<u8>,
}

/// Where the audio files live and which id plays which file.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct MusicConfig {
    pub directory: PathBuf,
    /// Track id to file name.
    pub tracks: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ControlConfig {
    /// Longest wait for a command, in milliseconds.
    pub tick_ms: u64,
    /// Pause after a failed loop iteration, in milliseconds.
    pub backoff_ms: u64,
    /// Bound of the event queue; unbounded when absent.
    pub queue_capacity: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AssetsConfig {
    /// Directory holding `aroma.html` and the files served under `/static`.
    pub static_dir: PathBuf,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// How long the virtual audio engine plays a track, in seconds.
    pub track_secs: u64,
}

impl Config {
    /// Load configuration from `aroma.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if the
    /// resulting configuration is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file("aroma.toml")?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("AROMA_HOST") {
            self.server.host = val;
        }
        if let Ok(val) = std::env::var("AROMA_PORT") {
            if let Ok(port) = val.parse() {
                self.server.port = port;
            }
        }
        if let Ok(val) = std::env::var("AROMA_BIND") {
            if let Some((host, port)) = val.rsplit_once(':') {
                self.server.host = host.to_string();
                if let Ok(port) = port.parse() {
                    self.server.port = port;
                }
            }
        }
        if let Ok(val) = std::env::var("AROMA_LOG") {
            self.logging.filter = val;
        }
        if let Ok(val) = std::env::var("RUST_LOG") {
            self.logging.filter = val;
        }
        if let Ok(val) = std::env::var("AROMA_LOG_FILE") {
            self.logging.file = PathBuf::from(val);
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Validation("port must be non-zero".to_string()));
        }
        if self.fans.pins.len() != FanId::COUNT {
            return Err(ConfigError::Validation(format!(
                "exactly {} fan pins are required, got {}",
                FanId::COUNT,
                self.fans.pins.len()
            )));
        }
        let mut seen = HashSet::new();
        if let Some(pin) = self.fans.pins.iter().find(|pin| !seen.insert(**pin)) {
            return Err(ConfigError::Validation(format!(
                "fan pin {pin} is listed more than once"
            )));
        }
        if self.log_file().is_some() && self.logging.keep_files == 0 {
            return Err(ConfigError::Validation(
                "at least one log file must be kept".to_string(),
            ));
        }
        if self.control.tick_ms == 0 {
            return Err(ConfigError::Validation(
                "control tick must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Return the `host:port` bind address.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    #[must_use]
    pub fn fan_pins(&self) -> Vec<GpioPin> {
        self.fans.pins.iter().copied().map(GpioPin::new).collect()
    }

    #[must_use]
    pub fn catalog(&self) -> TrackCatalog {
        TrackCatalog::new(self.music.directory.clone(), self.music.tracks.clone())
    }

    #[must_use]
    pub fn timing(&self) -> LoopTiming {
        LoopTiming {
            tick: Duration::from_millis(self.control.tick_ms),
            backoff: Duration::from_millis(self.control.backoff_ms),
        }
    }

    #[must_use]
    pub fn track_length(&self) -> Duration {
        Duration::from_secs(self.simulation.track_secs)
    }

    /// Log file path, or `None` when file logging is disabled.
    #[must_use]
    pub fn log_file(&self) -> Option<&Path> {
        let file = self.logging.file.as_path();
        (!file.as_os_str().is_empty()).then_some(file)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "aromad=info,aroma=info,tower_http=debug".to_string(),
            file: PathBuf::from("/var/log/aroma.log"),
            keep_files: 5,
        }
    }
}

impl Default for FansConfig {
    fn default() -> Self {
        Self {
            pins: aroma_app::fan_bank::DEFAULT_FAN_PINS
                .iter()
                .map(|pin| pin.bcm())
                .collect(),
        }
    }
}

impl Default for MusicConfig {
    fn default() -> Self {
        let catalog = TrackCatalog::default();
        let tracks = catalog
            .ids()
            .map(|id| {
                let file = catalog.file_name(id).unwrap_or_default();
                (id.to_string(), file.to_string())
            })
            .collect();
        Self {
            directory: catalog.directory().to_path_buf(),
            tracks,
        }
    }
}

impl Default for ControlConfig {
    fn default() -> Self {
        let timing = LoopTiming::default();
        Self {
            tick_ms: duration_ms(timing.tick),
            backoff_ms: duration_ms(timing.backoff),
            queue_capacity: None,
        }
    }
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            static_dir: PathBuf::from("static"),
        }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self { track_secs: 180 }
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use aroma_domain::id::TrackId;

    #[test]
    fn should_produce_sensible_defaults() {
        let config = Config::default();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.fans.pins, vec![19, 13, 12, 18]);
        assert_eq!(config.control.tick_ms, 1000);
        assert_eq!(config.control.queue_capacity, None);
        assert_eq!(config.assets.static_dir, PathBuf::from("static"));
        assert_eq!(config.log_file(), Some(Path::new("/var/log/aroma.log")));
        assert_eq!(config.logging.keep_files, 5);
    }

    #[test]
    fn should_default_to_the_builtin_catalog() {
        let config = Config::default();
        assert_eq!(config.catalog(), TrackCatalog::default());
    }

    #[test]
    fn should_parse_minimal_toml() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.server.port, 8000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn should_parse_full_toml() {
        let toml = "
            [server]
            host = '127.0.0.1'
            port = 9090

            [logging]
            filter = 'debug'
            file = '/tmp/aroma/aroma.log'
            keep_files = 2

            [fans]
            pins = [5, 6, 7, 8]

            [music]
            directory = '/srv/music'

            [music.tracks]
            a = 'a.mp3'

            [control]
            tick_ms = 250
            backoff_ms = 500
            queue_capacity = 64

            [assets]
            static_dir = '/srv/www'

            [simulation]
            track_secs = 5
        ";
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.bind_addr(), "127.0.0.1:9090");
        assert_eq!(config.logging.filter, "debug");
        assert_eq!(config.log_file(), Some(Path::new("/tmp/aroma/aroma.log")));
        assert_eq!(config.logging.keep_files, 2);
        assert_eq!(
            config.fan_pins(),
            vec![
                GpioPin::new(5),
                GpioPin::new(6),
                GpioPin::new(7),
                GpioPin::new(8)
            ]
        );
        let catalog = config.catalog();
        assert_eq!(
            catalog.path_for(&TrackId::new("a")),
            Some(PathBuf::from("/srv/music/a.mp3"))
        );
        assert!(!catalog.contains(&TrackId::new("1")));
        assert_eq!(
            config.timing(),
            LoopTiming {
                tick: Duration::from_millis(250),
                backoff: Duration::from_millis(500),
            }
        );
        assert_eq!(config.control.queue_capacity, Some(64));
        assert_eq!(config.assets.static_dir, PathBuf::from("/srv/www"));
        assert_eq!(config.track_length(), Duration::from_secs(5));
    }

    #[test]
    fn should_return_default_when_file_not_found() {
        let config = Config::from_file("nonexistent.toml").unwrap();
        assert_eq!(config.server.port, 8000);
    }

    #[test]
    fn should_reject_zero_port() {
        let mut config = Config::default();
        config.server.port = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn should_reject_wrong_number_of_pins() {
        let mut config = Config::default();
        config.fans.pins = vec![19, 13, 12];
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn should_reject_duplicate_pins() {
        let mut config = Config::default();
        config.fans.pins = vec![19, 13, 19, 18];
        let err = config.validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid configuration: fan pin 19 is listed more than once"
        );
    }

    #[test]
    fn should_disable_file_logging_with_empty_path() {
        let toml = "
            [logging]
            file = ''
            keep_files = 0
        ";
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.log_file(), None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn should_reject_keeping_no_log_files() {
        let mut config = Config::default();
        config.logging.keep_files = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn should_reject_zero_tick() {
        let mut config = Config::default();
        config.control.tick_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn should_format_bind_addr() {
        let config = Config::default();
        assert_eq!(config.bind_addr(), "0.0.0.0:8000");
    }

    #[test]
    fn should_parse_partial_toml_with_defaults() {
        let toml = "
            [server]
            port = 8080
        ";
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.fans.pins, vec![19, 13, 12, 18]);
        assert_eq!(config.simulation.track_secs, 180);
    }

    #[test]
    fn should_report_parse_error_for_invalid_toml() {
        let result: Result<Config, _> = toml::from_str("invalid {{{");
        assert!(result.is_err());
    }
}
