//! # aromad: the A-Roma daemon
//!
//! Composition root that wires the controllers, drivers and HTTP adapter
//! together and starts the server.
//!
//! ## Responsibilities
//! - Load configuration (`aroma.toml` plus environment overrides)
//! - Initialise structured logging (console, plus a rotated log file)
//! - Construct the drivers (adapters) and the event dispatcher
//! - Construct the fan bank and the playback controller, injecting drivers
//!   via port traits
//! - Build the axum router, bind to a TCP port and serve
//! - Handle graceful shutdown (SIGTERM/SIGINT): fans first, then music,
//!   then the dispatcher
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer; no control logic belongs here.

mod config;

use std::path::Path;
use std::sync::Arc;

use tokio::signal;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use aroma_adapter_http_axum::router;
use aroma_adapter_http_axum::state::AppState;
use aroma_adapter_virtual::{VirtualAudioEngine, VirtualOutputDriver};
use aroma_app::event_bus::EventDispatcher;
use aroma_app::fan_bank::FanBank;
use aroma_app::playback_controller::PlaybackController;

use crate::config::Config;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let _log_guard = init_tracing(
        &config.logging.filter,
        config.log_file(),
        config.logging.keep_files,
    );

    // Event dispatcher
    let dispatcher = match config.control.queue_capacity {
        Some(capacity) => EventDispatcher::with_capacity(capacity),
        None => EventDispatcher::new(),
    };

    // Controllers
    let timing = config.timing();
    let fans = Arc::new(FanBank::new(
        &config.fan_pins(),
        VirtualOutputDriver::default(),
        &dispatcher,
        timing,
    )?);
    let music = Arc::new(PlaybackController::new(
        VirtualAudioEngine::new(config.track_length()),
        config.catalog(),
        dispatcher.clone(),
        timing,
    ));

    dispatcher.start();
    if let Err(err) = fans.start() {
        tracing::error!(error = %err, "failed to initialise fan outputs");
        fans.stop().await;
        dispatcher.stop().await;
        return Err(err.into());
    }
    music.start();

    // HTTP
    let state = AppState::new(
        Arc::clone(&fans),
        Arc::clone(&music),
        dispatcher.clone(),
        config.assets.static_dir.clone(),
    );
    let app = router::build(state);

    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(%bind_addr, "aromad listening");

    let streams = dispatcher.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            tracing::info!("shutdown requested, closing live streams");
            streams.unsubscribe_all();
        })
        .await?;

    fans.stop().await;
    music.stop().await;
    dispatcher.stop().await;
    tracing::info!("aromad stopped");

    Ok(())
}

/// Console output plus, when `log_file` is set, a daily rotated file.
///
/// The returned guard flushes the file writer on drop and must live until
/// the end of `main`.
fn init_tracing(
    filter: &str,
    log_file: Option<&Path>,
    keep_files: usize,
) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_new(filter).unwrap_or_else(|err| {
        eprintln!("invalid log filter {filter:?}: {err}, falling back to info");
        EnvFilter::new("info")
    });

    let (file_layer, guard) = match log_file.map(|path| file_appender(path, keep_files)) {
        Some(Ok(appender)) => {
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        Some(Err(err)) => {
            eprintln!("cannot open log file: {err}, logging to the console only");
            (None, None)
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(file_layer)
        .with(filter)
        .init();
    guard
}

fn file_appender(
    path: &Path,
    keep_files: usize,
) -> Result<RollingFileAppender, tracing_appender::rolling::InitError> {
    let directory = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let prefix = path
        .file_name()
        .map_or_else(|| "aroma.log".to_string(), |name| name.to_string_lossy().into_owned());
    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(prefix)
        .max_log_files(keep_files)
        .build(directory)
}

/// Resolves on Ctrl-C, or on SIGTERM on unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!(%err, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                tracing::error!(%err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
