use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::{Instant, timeout};

use crate::config::SensorConfig;
use crate::convert::{convert, round_to};
use crate::errors::{AcquisitionError, ConfigError};
use crate::publisher::{ChangePublisher, PublishSink, SensorState};
use crate::source::SampleSource;
use crate::validator::Bounds;
use crate::window::SmoothingWindow;

/// Anything the poll manager can drive on a fixed interval.
#[async_trait]
pub trait Device: Send {
    fn name(&self) -> &str;

    fn poll_interval(&self) -> Duration;

    async fn poll(&mut self);
}

/// Result of a single poll tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickOutcome {
    /// The device could not be read; nothing changed.
    AcquisitionFailed,
    /// The raw Celsius reading was outside the hardware fault bounds.
    Rejected(f64),
    /// The reading was kept but the representative value was not plausible.
    Implausible(Option<f64>),
    /// Valid, but neither changed nor due for a heartbeat.
    Unchanged(f64),
    Published(f64),
}

pub struct Sensor {
    name: String,
    config: SensorConfig,
    source: Box<dyn SampleSource>,
    window: SmoothingWindow,
    publisher: ChangePublisher,
    /// Plausible range expressed in the published unit.
    plausible_bounds: Bounds,
}

impl Sensor {
    /// Validates the configuration, then reads and publishes once so that
    /// a freshly started sensor reports without waiting a full interval.
    pub async fn new<S>(
        name: impl Into<String>,
        config: SensorConfig,
        source: S,
        sinks: Vec<Arc<dyn PublishSink>>,
    ) -> Result<Self, ConfigError>
    where
        S: SampleSource + 'static,
    {
        config.validate()?;

        let window = SmoothingWindow::new(config.smoothing, config.window_size, config.precision);
        let publisher = ChangePublisher::new(
            sinks,
            config.destination.clone(),
            config.precision,
            config.forced_interval,
        );
        let plausible_bounds = config.plausible_bounds.converted(config.unit.is_fahrenheit());

        let mut sensor = Self {
            name: name.into(),
            config,
            source: Box::new(source),
            window,
            publisher,
            plausible_bounds,
        };

        tracing::info!(
            "Configuring sensor {}: device='{}' poll={:?} destination='{}' smoothing={} window={}",
            sensor.name,
            sensor.source.describe(),
            sensor.config.poll_interval,
            sensor.config.destination,
            sensor.config.smoothing,
            sensor.window.capacity(),
        );

        match sensor.tick().await {
            TickOutcome::Published(_) | TickOutcome::Unchanged(_) => {}
            outcome => tracing::warn!("Initial reading of {} isn't valid: {:?}", sensor.name, outcome),
        }

        Ok(sensor)
    }

    pub fn config(&self) -> &SensorConfig {
        &self.config
    }

    pub fn state(&self) -> &SensorState {
        self.publisher.state()
    }

    pub fn window(&self) -> &SmoothingWindow {
        &self.window
    }

    #[tracing::instrument(name = "tick", skip(self), fields(sensor = %self.name))]
    pub async fn tick(&mut self) -> TickOutcome {
        let raw = match self.acquire().await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::debug!("Error reading {}: {}", self.source.describe(), e);
                return TickOutcome::AcquisitionFailed;
            }
        };

        if !self.config.fault_bounds.accepts(Some(raw)) {
            tracing::warn!(
                "Last reading {} isn't valid, preserving old reading {:?}",
                raw,
                self.state().last_value
            );
            return TickOutcome::Rejected(raw);
        }

        let value = round_to(convert(raw, self.config.unit.is_fahrenheit()), self.config.precision);
        self.window.push(value);

        let current = match self.window.reduce() {
            Some(current) if self.plausible_bounds.accepts(Some(current)) => current,
            other => {
                tracing::warn!("Unreasonable temperature reading of {:?}, not publishing", other);
                return TickOutcome::Implausible(other);
            }
        };
        tracing::debug!("Read value {} (representative {})", value, current);

        if self.publisher.maybe_publish(Some(current), Instant::now()).await {
            TickOutcome::Published(current)
        } else {
            TickOutcome::Unchanged(current)
        }
    }

    async fn acquire(&mut self) -> Result<f64, AcquisitionError> {
        timeout(self.config.acquisition_timeout, self.source.acquire())
            .await
            .map_err(|_| AcquisitionError::Timeout)?
    }
}

#[async_trait]
impl Device for Sensor {
    fn name(&self) -> &str {
        &self.name
    }

    fn poll_interval(&self) -> Duration {
        self.config.poll_interval
    }

    async fn poll(&mut self) {
        self.tick().await;
    }
}
