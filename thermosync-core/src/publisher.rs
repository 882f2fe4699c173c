use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use crate::convert::format_value;
use crate::errors::PublishError;

/// Downstream destination for representative values.
///
/// Sinks are shared between sensors, so implementations that hold
/// connection state must do their own locking.
#[async_trait]
pub trait PublishSink: Send + Sync {
    fn name(&self) -> &str;

    async fn publish(&self, value: &str, destination: &str) -> Result<(), PublishError>;
}

/// What was last sent for a sensor.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SensorState {
    pub last_value: Option<f64>,
    /// `None` until the first publication.
    pub last_publish: Option<Instant>,
}

pub struct ChangePublisher {
    sinks: Vec<Arc<dyn PublishSink>>,
    destination: String,
    precision: u32,
    forced_interval: Duration,
    state: SensorState,
}

impl ChangePublisher {
    pub fn new(
        sinks: Vec<Arc<dyn PublishSink>>,
        destination: impl Into<String>,
        precision: u32,
        forced_interval: Duration,
    ) -> Self {
        Self {
            sinks,
            destination: destination.into(),
            precision,
            forced_interval,
            state: SensorState::default(),
        }
    }

    pub fn state(&self) -> &SensorState {
        &self.state
    }

    pub fn sinks(&self) -> &[Arc<dyn PublishSink>] {
        &self.sinks
    }

    /// True when `current` differs from the last sent value or the forced
    /// refresh interval has run out.
    pub fn should_publish(&self, current: f64, now: Instant) -> bool {
        let changed = self.state.last_value != Some(current);
        let stale = match self.state.last_publish {
            Some(at) => now.saturating_duration_since(at) > self.forced_interval,
            None => true,
        };

        changed || stale
    }

    /// Sends `current` to every sink when it changed or the heartbeat is due.
    ///
    /// Delivery is best effort: a failing sink is logged and the remaining
    /// sinks are still called. The state records what was sent as soon as
    /// one sink call has been attempted, whether or not it succeeded.
    pub async fn maybe_publish(&mut self, current: Option<f64>, now: Instant) -> bool {
        let Some(current) = current else {
            return false;
        };

        if !self.should_publish(current, now) {
            return false;
        }

        let text = format_value(current, self.precision);
        tracing::debug!("Publish temperature '{}' to '{}'", text, self.destination);

        let mut attempted = false;
        for sink in &self.sinks {
            attempted = true;
            if let Err(e) = sink.publish(&text, &self.destination).await {
                tracing::error!("Failed to publish to {}: {}", sink.name(), e);
            }
        }

        if attempted {
            self.state.last_value = Some(current);
            self.state.last_publish = Some(now);
        }

        attempted
    }
}


#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::mock::RecordingSink;
    use super::*;

    fn publisher(sinks: Vec<Arc<dyn PublishSink>>) -> ChangePublisher {
        ChangePublisher::new(sinks, "home.temp", 1, Duration::from_secs(60))
    }

    #[tokio::test]
    async fn test_first_value_is_published() {
        let sink = RecordingSink::new("a");
        let mut publisher = publisher(vec![sink.clone()]);
        let now = Instant::now();

        assert!(publisher.maybe_publish(Some(20.2), now).await);
        assert_eq!(
            *sink.published.lock().unwrap(),
            vec![("20.2".to_string(), "home.temp".to_string())]
        );
        assert_eq!(publisher.state().last_value, Some(20.2));
        assert_eq!(publisher.state().last_publish, Some(now));
    }

    #[tokio::test]
    async fn test_unchanged_value_publishes_once() {
        let sink = RecordingSink::new("a");
        let mut publisher = publisher(vec![sink.clone()]);
        let now = Instant::now();

        assert!(publisher.maybe_publish(Some(20.2), now).await);
        assert!(!publisher.maybe_publish(Some(20.2), now).await);
        assert!(!publisher.maybe_publish(Some(20.2), now + Duration::from_secs(60)).await);

        assert_eq!(sink.values().len(), 1);
    }

    #[tokio::test]
    async fn test_heartbeat_after_forced_interval() {
        let sink = RecordingSink::new("a");
        let mut publisher = publisher(vec![sink.clone()]);
        let start = Instant::now();

        publisher.maybe_publish(Some(20.2), start).await;
        assert!(publisher.maybe_publish(Some(20.2), start + Duration::from_secs(61)).await);

        assert_eq!(sink.values(), vec!["20.2", "20.2"]);
    }

    #[tokio::test]
    async fn test_changed_value_is_published() {
        let sink = RecordingSink::new("a");
        let mut publisher = publisher(vec![sink.clone()]);
        let now = Instant::now();

        publisher.maybe_publish(Some(20.2), now).await;
        assert!(publisher.maybe_publish(Some(20.3), now).await);

        assert_eq!(sink.values(), vec!["20.2", "20.3"]);
    }

    #[tokio::test]
    async fn test_absent_value_is_never_published() {
        let sink = RecordingSink::new("a");
        let mut publisher = publisher(vec![sink.clone()]);

        assert!(!publisher.maybe_publish(None, Instant::now()).await);
        assert!(sink.values().is_empty());
        assert_eq!(*publisher.state(), SensorState::default());
    }

    #[tokio::test]
    async fn test_failing_sink_does_not_block_others() {
        let journal = Arc::new(Mutex::new(Vec::new()));
        let broken = RecordingSink::journaled("broken", true, &journal);
        let healthy = RecordingSink::journaled("healthy", false, &journal);
        let mut publisher = publisher(vec![broken.clone(), healthy.clone()]);

        assert!(publisher.maybe_publish(Some(19.8), Instant::now()).await);

        assert_eq!(*journal.lock().unwrap(), vec!["broken", "healthy"]);
        assert_eq!(broken.values(), vec!["19.8"]);
        assert_eq!(healthy.values(), vec!["19.8"]);
        assert_eq!(publisher.state().last_value, Some(19.8));
    }

    #[tokio::test]
    async fn test_sinks_called_in_registration_order() {
        let journal = Arc::new(Mutex::new(Vec::new()));
        let sinks: Vec<Arc<dyn PublishSink>> = ["graphite", "log", "openhab"]
            .into_iter()
            .map(|name| RecordingSink::journaled(name, false, &journal) as Arc<dyn PublishSink>)
            .collect();
        let mut publisher = publisher(sinks);

        let names: Vec<&str> = publisher.sinks().iter().map(|sink| sink.name()).collect();
        assert_eq!(names, vec!["graphite", "log", "openhab"]);

        let now = Instant::now();
        publisher.maybe_publish(Some(20.0), now).await;
        publisher.maybe_publish(Some(20.5), now).await;

        assert_eq!(
            *journal.lock().unwrap(),
            vec!["graphite", "log", "openhab", "graphite", "log", "openhab"]
        );
    }

    #[tokio::test]
    async fn test_no_sinks_leaves_state_untouched() {
        let mut publisher = publisher(Vec::new());

        assert!(!publisher.maybe_publish(Some(21.0), Instant::now()).await);
        assert_eq!(publisher.state().last_value, None);
    }
}
