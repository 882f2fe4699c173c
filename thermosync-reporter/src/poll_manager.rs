use thermosync_core::Device;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};

/// Drives every device on its own interval, one task per device.
pub struct PollManager {
    devices: Vec<Box<dyn Device>>,
}

impl PollManager {
    pub fn new(devices: Vec<Box<dyn Device>>) -> Self {
        Self { devices }
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Starts polling. The first poll of each device is one interval from
    /// now, since devices already read once while they were created.
    pub fn start(self) -> RunningPolls {
        let (stop_tx, stop_rx) = watch::channel(false);

        let tasks = self
            .devices
            .into_iter()
            .map(|device| tokio::spawn(poll_loop(device, stop_rx.clone())))
            .collect();

        RunningPolls { stop_tx, tasks }
    }
}

async fn poll_loop(mut device: Box<dyn Device>, mut stop_rx: watch::Receiver<bool>) {
    let period = device.poll_interval();
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    tracing::debug!("Polling {} every {:?}", device.name(), period);

    loop {
        tokio::select! {
            _ = stop_rx.changed() => break,
            _ = ticker.tick() => device.poll().await,
        }
    }

    tracing::debug!("Stopped polling {}", device.name());
}

pub struct RunningPolls {
    stop_tx: watch::Sender<bool>,
    tasks: Vec<JoinHandle<()>>,
}

impl RunningPolls {
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Signals every poll task and waits for them to finish. A poll that is
    /// already in progress completes first.
    pub async fn stop(self) {
        let _ = self.stop_tx.send(true);

        for task in self.tasks {
            if let Err(e) = task.await {
                tracing::error!("Poll task failed: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;

    struct CountingDevice {
        interval: Duration,
        polls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Device for CountingDevice {
        fn name(&self) -> &str {
            "counter"
        }

        fn poll_interval(&self) -> Duration {
            self.interval
        }

        async fn poll(&mut self) {
            self.polls.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn counting(secs: u64) -> (Box<dyn Device>, Arc<AtomicUsize>) {
        let polls = Arc::new(AtomicUsize::new(0));
        let device = CountingDevice {
            interval: Duration::from_secs(secs),
            polls: Arc::clone(&polls),
        };
        (Box::new(device), polls)
    }

    #[tokio::test(start_paused = true)]
    async fn test_devices_poll_on_their_own_interval() {
        let (fast, fast_polls) = counting(5);
        let (slow, slow_polls) = counting(20);

        let running = PollManager::new(vec![fast, slow]).start();
        assert_eq!(running.len(), 2);

        tokio::time::sleep(Duration::from_millis(60_500)).await;
        running.stop().await;

        assert_eq!(fast_polls.load(Ordering::SeqCst), 12);
        assert_eq!(slow_polls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_polls_after_stop() {
        let (device, polls) = counting(1);

        let running = PollManager::new(vec![device]).start();
        tokio::time::sleep(Duration::from_millis(2_500)).await;
        running.stop().await;

        let stopped_at = polls.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_secs(10)).await;

        assert_eq!(stopped_at, 2);
        assert_eq!(polls.load(Ordering::SeqCst), stopped_at);
    }

    #[tokio::test]
    async fn test_empty_manager() {
        let manager = PollManager::new(Vec::new());
        assert!(manager.is_empty());

        let running = manager.start();
        assert!(running.is_empty());
        running.stop().await;
    }
}
