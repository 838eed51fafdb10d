//! Periodic refresh timers owned by a navigation session
//!
//! One task per [`RefreshKind`]. The period is recomputed before every sleep
//! from the latest battery level, so a battery change takes effect on the
//! next tick.

use crate::config::RefreshIntervals;
use crate::outputs::RefreshHandler;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use wnav_common::events::{EventBus, NavEvent, RefreshKind};

/// Interval multiplier for a battery level in percent (`None` = unknown)
pub fn battery_multiplier(level_percent: Option<u8>) -> f64 {
    match level_percent {
        Some(level) if level < 15 => 3.0,
        Some(level) if level < 30 => 2.0,
        Some(level) if level < 50 => 1.5,
        _ => 1.0,
    }
}

/// Base interval scaled for the battery level
pub fn scaled_interval(base: Duration, level_percent: Option<u8>) -> Duration {
    base.mul_f64(battery_multiplier(level_percent))
}

/// Running refresh timer tasks
pub struct RefreshTimers {
    shutdown_tx: watch::Sender<bool>,
    handles: Vec<JoinHandle<()>>,
}

impl RefreshTimers {
    /// Spawn one timer task per refresh kind
    ///
    /// Kinds with a zero interval are not started.
    pub fn start(
        intervals: RefreshIntervals,
        battery: watch::Receiver<Option<u8>>,
        handler: Arc<dyn RefreshHandler>,
        event_bus: Arc<EventBus>,
    ) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let mut handles = Vec::with_capacity(RefreshKind::ALL.len());

        for kind in RefreshKind::ALL {
            let base = intervals.for_kind(kind);
            if base.is_zero() {
                warn!(%kind, "Refresh interval is zero, timer disabled");
                continue;
            }

            let battery = battery.clone();
            let mut shutdown_rx = shutdown_rx.clone();
            let handler = Arc::clone(&handler);
            let event_bus = Arc::clone(&event_bus);

            handles.push(tokio::spawn(async move {
                loop {
                    let level = *battery.borrow();
                    let period = scaled_interval(base, level);

                    tokio::select! {
                        _ = tokio::time::sleep(period) => {
                            debug!(%kind, period_ms = period.as_millis() as u64, "Refresh due");
                            event_bus.emit_lossy(NavEvent::RefreshDue {
                                kind,
                                timestamp: chrono::Utc::now(),
                            });
                            handler.refresh(kind).await;
                        }
                        _ = shutdown_rx.changed() => break,
                    }
                }
            }));
        }

        Self { shutdown_tx, handles }
    }

    /// Number of running timer tasks
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Cancel every timer and wait for the tasks to finish
    pub async fn shutdown(self) {
        self.shutdown_tx.send_replace(true);
        for handle in self.handles {
            handle.abort();
            if let Err(e) = handle.await {
                if !e.is_cancelled() {
                    warn!(error = %e, "Refresh timer task failed");
                }
            }
        }
    }
}
