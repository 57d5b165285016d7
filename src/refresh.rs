//! Background polling timers for the dashboard
//!
//! Two interval tasks tick independently: one for the live data (latest
//! traffic, events, summary, alerts, system status, map) and a slower one for
//! the weekly report. Ticks are delivered over a tokio channel and the owner
//! decides what to fetch.

use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::time::MissedTickBehavior;

/// Messages sent from the background timers to the dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshMessage {
    /// Time to reload the live data
    LiveTick,
    /// Time to reload the weekly report
    ReportTick,
}

/// Configuration for refresh intervals
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshConfig {
    /// Interval for the live data
    pub live_interval: Duration,
    /// Interval for the weekly report
    pub report_interval: Duration,
    /// Whether auto-refresh is enabled
    pub enabled: bool,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            live_interval: Duration::from_secs(30),
            report_interval: Duration::from_secs(300), // 5 minutes
            enabled: true,
        }
    }
}

/// Handle for controlling the background timers
///
/// Dropping the handle or calling [`RefreshHandle::shutdown`] stops both tasks.
pub struct RefreshHandle {
    /// Channel for receiving ticks
    pub receiver: mpsc::Receiver<RefreshMessage>,
    shutdown_tx: watch::Sender<bool>,
}

impl RefreshHandle {
    /// Creates a new RefreshHandle and spawns the timer tasks
    ///
    /// Must be called from within a tokio runtime. The first tick of each
    /// timer fires one full interval after spawning; the caller is expected to
    /// load the initial data itself.
    pub fn spawn(config: RefreshConfig) -> Self {
        let (msg_tx, msg_rx) = mpsc::channel(32);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        if config.enabled {
            spawn_ticker(
                config.live_interval,
                RefreshMessage::LiveTick,
                msg_tx.clone(),
                shutdown_rx.clone(),
            );
            spawn_ticker(
                config.report_interval,
                RefreshMessage::ReportTick,
                msg_tx,
                shutdown_rx,
            );
        }

        Self {
            receiver: msg_rx,
            shutdown_tx,
        }
    }

    /// Stops the background timers
    pub fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
    }
}

fn spawn_ticker(
    period: Duration,
    message: RefreshMessage,
    tx: mpsc::Sender<RefreshMessage>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // Skip the first tick (immediate)
        interval.tick().await;

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if tx.send(message).await.is_err() {
                        break;
                    }
                }
                _ = shutdown_rx.changed() => {
                    break;
                }
            }
        }
        tracing::debug!(?message, "Refresh timer stopped");
    });
}

/// Checks for pending ticks without blocking
///
/// # Returns
/// * `Some(RefreshMessage)` if a tick was available
/// * `None` if no ticks are pending
pub fn try_recv(handle: &mut RefreshHandle) -> Option<RefreshMessage> {
    handle.receiver.try_recv().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refresh_config_default() {
        let config = RefreshConfig::default();
        assert_eq!(config.live_interval, Duration::from_secs(30));
        assert_eq!(config.report_interval, Duration::from_secs(300));
        assert!(config.enabled);
    }

    #[tokio::test]
    async fn test_refresh_handle_spawn_disabled() {
        let config = RefreshConfig {
            enabled: false,
            ..Default::default()
        };

        let mut handle = RefreshHandle::spawn(config);

        // With refresh disabled, there should be no ticks and no live senders
        assert!(try_recv(&mut handle).is_none());
        assert!(handle.receiver.recv().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_live_tick_after_one_interval() {
        let start = tokio::time::Instant::now();
        let mut handle = RefreshHandle::spawn(RefreshConfig::default());

        let msg = handle.receiver.recv().await;

        assert_eq!(msg, Some(RefreshMessage::LiveTick));
        assert!(start.elapsed() >= Duration::from_secs(30));
        assert!(start.elapsed() < Duration::from_secs(31));
    }

    #[tokio::test(start_paused = true)]
    async fn test_report_tick_uses_its_own_interval() {
        let mut handle = RefreshHandle::spawn(RefreshConfig {
            live_interval: Duration::from_secs(600),
            report_interval: Duration::from_secs(300),
            enabled: true,
        });

        assert_eq!(handle.receiver.recv().await, Some(RefreshMessage::ReportTick));
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_stops_ticks() {
        let mut handle = RefreshHandle::spawn(RefreshConfig::default());
        assert_eq!(handle.receiver.recv().await, Some(RefreshMessage::LiveTick));

        let mut receiver = std::mem::replace(&mut handle.receiver, mpsc::channel(1).1);
        handle.shutdown();

        // Both tasks exit and drop their senders
        assert!(receiver.recv().await.is_none());
    }
}
