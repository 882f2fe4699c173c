use std::path::PathBuf;

use crate::poll_manager::{PollManager, RunningPolls};
use crate::registry::{build_devices, build_sinks};
use crate::settings::Settings;

pub mod drivers;
pub mod poll_manager;
pub mod registry;
pub mod settings;
pub mod sinks;

enum Signal {
    Reload,
    Terminate,
}

/// Creates connections and sensors from `settings` and starts polling them.
pub async fn start(settings: &Settings) -> RunningPolls {
    let sinks = build_sinks(settings);
    let devices = build_devices(settings, &sinks).await;

    if devices.is_empty() {
        tracing::warn!("No sensors configured, nothing to poll");
    }

    let running = PollManager::new(devices).start();
    tracing::info!("Polling {} sensors", running.len());
    running
}

/// Runs until SIGTERM or Ctrl-C. SIGHUP reloads the configuration and
/// rebuilds every sensor; the old sensors keep running if the new
/// configuration cannot be loaded.
pub async fn run(config_path: Option<PathBuf>, settings: Settings) -> anyhow::Result<()> {
    let mut signals = Signals::new()?;
    let mut running = start(&settings).await;

    loop {
        match signals.next().await {
            Signal::Reload => {
                tracing::info!("Reloading configuration");

                match Settings::load(config_path.as_deref()) {
                    Ok(settings) => {
                        running.stop().await;
                        running = start(&settings).await;
                    }
                    Err(e) => tracing::error!("Failed to reload configuration: {}", e),
                }
            }
            Signal::Terminate => {
                tracing::info!("Shutting down");
                running.stop().await;
                return Ok(());
            }
        }
    }
}

#[cfg(unix)]
struct Signals {
    hangup: tokio::signal::unix::Signal,
    terminate: tokio::signal::unix::Signal,
}

#[cfg(unix)]
impl Signals {
    fn new() -> std::io::Result<Self> {
        use tokio::signal::unix::{SignalKind, signal};

        Ok(Self {
            hangup: signal(SignalKind::hangup())?,
            terminate: signal(SignalKind::terminate())?,
        })
    }

    async fn next(&mut self) -> Signal {
        tokio::select! {
            _ = self.hangup.recv() => Signal::Reload,
            _ = self.terminate.recv() => Signal::Terminate,
            _ = tokio::signal::ctrl_c() => Signal::Terminate,
        }
    }
}

#[cfg(not(unix))]
struct Signals;

#[cfg(not(unix))]
impl Signals {
    fn new() -> std::io::Result<Self> {
        Ok(Self)
    }

    async fn next(&mut self) -> Signal {
        let _ = tokio::signal::ctrl_c().await;
        Signal::Terminate
    }
}
