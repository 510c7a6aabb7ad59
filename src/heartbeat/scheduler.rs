//! Periodic liveness reporting.
//!
//! # States
//! ```text
//! HeartbeatScheduler (idle) ──start()──▶ Running ──stop()──▶ Stopped (terminal)
//! ```
//!
//! # Design Decisions
//! - First announcement goes out immediately, then one per interval
//! - A failed send waits for the next tick; there is no retry loop
//! - Missed ticks are not replayed in a burst
//! - The stop signal races every tick and every in-flight send

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::Instrument;

use crate::error::{BootstrapError, Result};
use crate::heartbeat::announcement::Announcement;
use crate::heartbeat::sender::{HeartbeatSendError, HeartbeatSender};
use crate::observability::metrics;

const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(5);
const STOP_WAIT: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeartbeatState {
    Running,
    Stopped,
}

/// A configured, not yet started heartbeat.
pub struct HeartbeatScheduler {
    interval: Duration,
    send_timeout: Duration,
    sender: Arc<dyn HeartbeatSender>,
    module: String,
    component: String,
}

impl HeartbeatScheduler {
    /// A zero interval is rejected rather than treated as "disabled".
    pub fn new(
        interval: Duration,
        sender: Arc<dyn HeartbeatSender>,
        module: impl Into<String>,
        component: impl Into<String>,
    ) -> Result<Self> {
        if interval.is_zero() {
            return Err(BootstrapError::InvalidConfiguration(vec![
                "heartbeat.interval: must be a positive duration".to_string(),
            ]));
        }

        Ok(Self {
            interval,
            send_timeout: DEFAULT_SEND_TIMEOUT,
            sender,
            module: module.into(),
            component: component.into(),
        })
    }

    pub fn with_send_timeout(mut self, send_timeout: Duration) -> Self {
        self.send_timeout = send_timeout;
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Spawn the tick task on the current runtime.
    pub fn start(self) -> HeartbeatHandle {
        let (stop_tx, stop_rx) = watch::channel(false);
        let span = tracing::info_span!("heartbeat", module = %self.module);

        tracing::info!(
            interval_ms = self.interval.as_millis() as u64,
            module = %self.module,
            "Heartbeat starting"
        );

        let task = tokio::spawn(self.run(stop_rx).instrument(span));

        HeartbeatHandle {
            stop_tx,
            task: Some(task),
            state: HeartbeatState::Running,
        }
    }

    async fn run(self, mut stop: watch::Receiver<bool>) {
        let mut ticker = time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = stop.changed() => break,
                _ = ticker.tick() => {}
            }

            if *stop.borrow() {
                break;
            }

            let announcement = Announcement::now(&self.module, &self.component);

            tokio::select! {
                biased;
                _ = stop.changed() => {
                    tracing::debug!("Heartbeat send cancelled by stop");
                    break;
                }
                result = time::timeout(self.send_timeout, self.sender.send(&announcement)) => {
                    let result = result.unwrap_or(Err(HeartbeatSendError::Timeout(self.send_timeout)));
                    match result {
                        Ok(()) => {
                            metrics::record_heartbeat(true);
                            tracing::trace!(timestamp = announcement.timestamp, "Heartbeat sent");
                        }
                        Err(e) => {
                            metrics::record_heartbeat(false);
                            tracing::warn!(error = %e, "Heartbeat send failed, will retry on next tick");
                        }
                    }
                }
            }
        }

        tracing::info!("Heartbeat stopped");
    }
}

/// Handle to a running heartbeat.
pub struct HeartbeatHandle {
    stop_tx: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
    state: HeartbeatState,
}

impl HeartbeatHandle {
    pub fn state(&self) -> HeartbeatState {
        self.state
    }

    /// Stop ticking. Returns once the task has exited; nothing is sent
    /// after this returns. Calling it again has no effect.
    pub async fn stop(&mut self) {
        if self.state == HeartbeatState::Stopped {
            return;
        }

        self.stop_tx.send_replace(true);

        if let Some(mut task) = self.task.take() {
            if time::timeout(STOP_WAIT, &mut task).await.is_err() {
                tracing::warn!("Heartbeat task did not exit in time, aborting");
                task.abort();
                let _ = task.await;
            }
        }

        self.state = HeartbeatState::Stopped;
    }
}

impl Drop for HeartbeatHandle {
    fn drop(&mut self) {
        self.stop_tx.send_replace(true);
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tokio::time::Instant;

    #[derive(Default)]
    struct Recording {
        sent: Mutex<Vec<(Instant, Announcement)>>,
    }

    impl Recording {
        fn count(&self) -> usize {
            self.sent.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl HeartbeatSender for Recording {
        async fn send(&self, announcement: &Announcement) -> Result<(), HeartbeatSendError> {
            self.sent.lock().unwrap().push((Instant::now(), announcement.clone()));
            Ok(())
        }
    }

    #[derive(Default)]
    struct Failing {
        attempts: AtomicUsize,
    }

    #[async_trait]
    impl HeartbeatSender for Failing {
        async fn send(&self, _: &Announcement) -> Result<(), HeartbeatSendError> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            Err(HeartbeatSendError::Status(503))
        }
    }

    #[derive(Default)]
    struct Hanging {
        attempts: AtomicUsize,
    }

    #[async_trait]
    impl HeartbeatSender for Hanging {
        async fn send(&self, _: &Announcement) -> Result<(), HeartbeatSendError> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            std::future::pending::<()>().await;
            Ok(())
        }
    }

    fn scheduler(sender: Arc<dyn HeartbeatSender>) -> HeartbeatScheduler {
        HeartbeatScheduler::new(Duration::from_millis(100), sender, "echo-1", "echo").unwrap()
    }

    #[test]
    fn zero_interval_is_invalid() {
        let err = HeartbeatScheduler::new(Duration::ZERO, Arc::new(Recording::default()), "m", "c")
            .err()
            .unwrap();
        assert!(matches!(err, BootstrapError::InvalidConfiguration(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_once_per_interval_starting_immediately() {
        let sender = Arc::new(Recording::default());
        let scheduler = scheduler(sender.clone());
        assert_eq!(scheduler.interval(), Duration::from_millis(100));

        let mut handle = scheduler.start();
        assert_eq!(handle.state(), HeartbeatState::Running);

        time::sleep(Duration::from_millis(350)).await;
        handle.stop().await;

        // t = 0, 100, 200, 300
        assert_eq!(sender.count(), 4);
        let sent = sender.sent.lock().unwrap();
        assert_eq!(sent[0].1.module, "echo-1");
        assert_eq!(sent[0].1.component, "echo");
    }

    #[tokio::test(start_paused = true)]
    async fn nothing_is_sent_after_stop_returns() {
        let sender = Arc::new(Recording::default());
        let mut handle = scheduler(sender.clone()).start();

        time::sleep(Duration::from_millis(250)).await;
        handle.stop().await;
        let stopped_at = Instant::now();
        let count = sender.count();

        time::sleep(Duration::from_secs(5)).await;
        assert_eq!(sender.count(), count);
        assert!(sender
            .sent
            .lock()
            .unwrap()
            .iter()
            .all(|(at, _)| *at <= stopped_at));
    }

    #[tokio::test(start_paused = true)]
    async fn stop_is_idempotent() {
        let sender = Arc::new(Recording::default());
        let mut handle = scheduler(sender.clone()).start();
        time::sleep(Duration::from_millis(150)).await;

        handle.stop().await;
        let after_first = (handle.state(), sender.count());
        handle.stop().await;
        assert_eq!((handle.state(), sender.count()), after_first);
        assert_eq!(handle.state(), HeartbeatState::Stopped);
    }

    #[tokio::test(start_paused = true)]
    async fn failures_are_retried_only_on_next_tick() {
        let sender = Arc::new(Failing::default());
        let mut handle = scheduler(sender.clone()).start();

        time::sleep(Duration::from_millis(350)).await;
        handle.stop().await;

        assert_eq!(sender.attempts.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_interrupts_a_hanging_send() {
        let sender = Arc::new(Hanging::default());
        let mut handle = scheduler(sender.clone())
            .with_send_timeout(Duration::from_secs(3600))
            .start();

        time::sleep(Duration::from_millis(10)).await;
        assert_eq!(sender.attempts.load(Ordering::SeqCst), 1);

        let started = Instant::now();
        handle.stop().await;
        assert!(started.elapsed() < STOP_WAIT);
        assert_eq!(handle.state(), HeartbeatState::Stopped);
    }

    #[tokio::test(start_paused = true)]
    async fn hanging_send_times_out_and_next_tick_still_fires() {
        let sender = Arc::new(Hanging::default());
        let mut handle = scheduler(sender.clone())
            .with_send_timeout(Duration::from_millis(50))
            .start();

        time::sleep(Duration::from_millis(250)).await;
        handle.stop().await;

        // Ticks at 0, 100, 200 each time out after 50ms.
        assert_eq!(sender.attempts.load(Ordering::SeqCst), 3);
    }
}
