//! Async session controller
//!
//! Owns the session lifecycle (`Stopped → Starting → Active → Stopped`), feeds
//! fixes into the [`NavigationSession`], and dispatches what comes out to the
//! outputs and the event bus. The session lock is never held across an
//! await: reroute completion re-locks and re-checks the generation before
//! touching the route.

use super::timers::RefreshTimers;
use super::{FixReport, NavigationSession, RerouteTicket};
use crate::config::SessionSettings;
use crate::error::{Error, Result};
use crate::outputs::{Outputs, RefreshHandler};
use crate::tracking::position::{PositionEvent, PositionFix};
use crate::tracking::reroute::RerouteCoordinator;
use crate::tracking::route::ActiveRoute;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;
use wnav_common::events::{Announcement, EventBus, NavEvent, RefreshKind, SessionState, Severity};

/// Work deferred until the running session has been torn down
pub type DeferredUpdate = Box<dyn FnOnce() + Send + 'static>;

/// State shared with spawned reroute and timer tasks
struct Shared {
    session: Mutex<NavigationSession>,
    outputs: Outputs,
    event_bus: Arc<EventBus>,
    /// When the latest fix was processed; ETA polls run on the fix clock
    last_fix_at: Mutex<Option<Instant>>,
}

impl Shared {
    fn announce(&self, announcement: Announcement) {
        self.outputs.speak(&announcement.speech_text());
        self.event_bus.emit_lossy(NavEvent::AnnouncementIssued {
            announcement,
            timestamp: chrono::Utc::now(),
        });
    }

    async fn poll_eta(&self) -> Option<Announcement> {
        let last_fix_at = (*self.last_fix_at.lock().await)?;
        let since_last_fix_ms = i64::try_from(last_fix_at.elapsed().as_millis()).unwrap_or(i64::MAX);
        let announcement = self.session.lock().await.poll_eta(since_last_fix_ms)?;
        self.announce(announcement.clone());
        Some(announcement)
    }
}

/// Refresh handler installed into the session timers
///
/// Answers ETA polling itself and forwards every tick to the user handler.
struct SessionRefresh {
    shared: Arc<Shared>,
    downstream: Option<Arc<dyn RefreshHandler>>,
}

#[async_trait]
impl RefreshHandler for SessionRefresh {
    async fn refresh(&self, kind: RefreshKind) {
        if kind == RefreshKind::EtaPolling {
            self.shared.poll_eta().await;
        }
        if let Some(downstream) = &self.downstream {
            downstream.refresh(kind).await;
        }
    }
}

/// Drives one navigation session at a time
pub struct NavigationSessionController {
    shared: Arc<Shared>,
    rerouter: RerouteCoordinator,
    battery_tx: watch::Sender<Option<u8>>,
    timers: Mutex<Option<RefreshTimers>>,
    reroute_tasks: Mutex<Vec<JoinHandle<()>>>,
    deferred: Mutex<Option<DeferredUpdate>>,
    wake_lock_held: AtomicBool,
}

impl NavigationSessionController {
    pub fn new(
        settings: SessionSettings,
        rerouter: RerouteCoordinator,
        outputs: Outputs,
        event_bus: Arc<EventBus>,
    ) -> Self {
        let (battery_tx, _) = watch::channel(None);
        Self {
            shared: Arc::new(Shared {
                session: Mutex::new(NavigationSession::new(settings)),
                outputs,
                event_bus,
                last_fix_at: Mutex::new(None),
            }),
            rerouter,
            battery_tx,
            timers: Mutex::new(None),
            reroute_tasks: Mutex::new(Vec::new()),
            deferred: Mutex::new(None),
            wake_lock_held: AtomicBool::new(false),
        }
    }

    pub fn event_bus(&self) -> &Arc<EventBus> {
        &self.shared.event_bus
    }

    pub async fn state(&self) -> SessionState {
        self.shared.session.lock().await.state()
    }

    /// Snapshot of the active route
    pub async fn active_route(&self) -> Option<Arc<ActiveRoute>> {
        self.shared.session.lock().await.route()
    }

    /// Current session generation (bumped on start, stop and reroute)
    pub async fn generation(&self) -> u64 {
        self.shared.session.lock().await.generation()
    }

    /// Report the device battery level in percent; refresh timers slow down
    /// below 50 %
    pub fn set_battery_level(&self, percent: u8) {
        self.battery_tx.send_replace(Some(percent.min(100)));
    }

    /// Start navigating `route`
    ///
    /// Acquires the wake lock (best effort) and starts the refresh timers.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidState`] if a session is already running, or if it was
    /// stopped while starting.
    pub async fn start(&self, route: ActiveRoute) -> Result<Uuid> {
        let route_id = route.id;
        let (session_id, intervals) = {
            let mut session = self.shared.session.lock().await;
            session.start(route)?;
            (session.id(), session.settings().refresh)
        };

        let held = self.shared.outputs.acquire_wake_lock();
        self.wake_lock_held.store(held, Ordering::SeqCst);

        let handler: Arc<dyn RefreshHandler> = Arc::new(SessionRefresh {
            shared: Arc::clone(&self.shared),
            downstream: self.shared.outputs.refresh.clone(),
        });
        let timers = RefreshTimers::start(
            intervals,
            self.battery_tx.subscribe(),
            handler,
            Arc::clone(&self.shared.event_bus),
        );
        *self.timers.lock().await = Some(timers);

        if !self.shared.session.lock().await.mark_active() {
            self.teardown().await;
            return Err(Error::InvalidState("session stopped while starting".to_string()));
        }

        info!(%session_id, %route_id, "Navigation session started");
        self.shared.event_bus.emit_lossy(NavEvent::SessionStarted {
            session_id,
            route_id,
            timestamp: chrono::Utc::now(),
        });

        Ok(session_id)
    }

    /// Stop the session
    ///
    /// Cancels the refresh timers, releases the wake lock, then applies a
    /// deferred update if one was queued. Returns false if nothing was running.
    pub async fn stop(&self) -> bool {
        let session_id = {
            let mut session = self.shared.session.lock().await;
            let id = session.id();
            if !session.stop() {
                return false;
            }
            id
        };

        self.teardown().await;

        info!(%session_id, "Navigation session stopped");
        self.shared.event_bus.emit_lossy(NavEvent::SessionStopped {
            session_id,
            timestamp: chrono::Utc::now(),
        });

        if let Some(update) = self.deferred.lock().await.take() {
            info!("Applying deferred update");
            update();
        }

        true
    }

    async fn teardown(&self) {
        if let Some(timers) = self.timers.lock().await.take() {
            timers.shutdown().await;
        }
        if self.wake_lock_held.swap(false, Ordering::SeqCst) {
            self.shared.outputs.release_wake_lock();
        }
    }

    /// Queue work to run after the session stops
    ///
    /// Runs immediately when no session is active. A newer update replaces an
    /// older queued one.
    pub async fn queue_deferred_update(&self, update: DeferredUpdate) {
        // Held across the state check so a concurrent stop() cannot miss it
        let mut deferred = self.deferred.lock().await;
        if self.state().await == SessionState::Stopped {
            drop(deferred);
            update();
            return;
        }
        *deferred = Some(update);
    }

    /// Process one fix and dispatch its results
    ///
    /// # Errors
    ///
    /// [`Error::InvalidState`] when no session is active, [`Error::InvalidFix`]
    /// for unusable coordinates. Neither affects the running session.
    pub async fn handle_fix(&self, fix: PositionFix) -> Result<FixReport> {
        let report = self.shared.session.lock().await.process_fix(&fix)?;
        *self.shared.last_fix_at.lock().await = Some(Instant::now());

        let bus = &self.shared.event_bus;
        bus.emit_lossy(NavEvent::ProgressUpdated {
            closest_index: report.matched.closest_index,
            distance_to_route_m: report.matched.distance_to_route_m,
            remaining_distance_m: report.matched.remaining_distance_m,
            timestamp: chrono::Utc::now(),
        });

        for announcement in &report.announcements {
            self.shared.announce(announcement.clone());
        }

        if let Some(zoom) = report.zoom {
            self.shared
                .outputs
                .move_camera(report.position, zoom.new_level, zoom.duration_s);
            bus.emit_lossy(NavEvent::ZoomChanged {
                old_level: zoom.old_level,
                new_level: zoom.new_level,
                timestamp: chrono::Utc::now(),
            });
        }

        if let Some(ticket) = &report.reroute {
            bus.emit_lossy(NavEvent::RerouteRequested {
                origin: ticket.origin,
                distance_to_route_m: ticket.distance_to_route_m,
                timestamp: chrono::Utc::now(),
            });
            self.spawn_reroute(ticket.clone()).await;
        }

        Ok(report)
    }

    async fn spawn_reroute(&self, ticket: RerouteTicket) {
        let shared = Arc::clone(&self.shared);
        let rerouter = self.rerouter.clone();

        let handle = tokio::spawn(async move {
            let result = rerouter.reroute(ticket.origin, &ticket.destination, ticket.mode).await;

            let mut session = shared.session.lock().await;
            match result {
                Ok(route) => {
                    let route_id = route.id;
                    let distance_m = route.distance_m;
                    let duration_s = route.duration_s;
                    if !session.apply_reroute(ticket.generation, route) {
                        return;
                    }
                    let speak = session.settings().announcements_enabled;
                    drop(session);

                    shared.event_bus.emit_lossy(NavEvent::RerouteApplied {
                        route_id,
                        distance_m,
                        duration_s,
                        timestamp: chrono::Utc::now(),
                    });
                    if speak {
                        shared.announce(Announcement::Reroute);
                    }
                }
                Err(e) => {
                    if !session.is_current(ticket.generation) {
                        debug!(error = %e, "Ignoring failure of stale reroute");
                        return;
                    }
                    drop(session);

                    let message = e.to_string();
                    shared
                        .outputs
                        .notify("Route recalculation failed", &message, Severity::Warning);
                    shared.event_bus.emit_lossy(NavEvent::RerouteFailed {
                        message,
                        timestamp: chrono::Utc::now(),
                    });
                }
            }
        });

        let mut tasks = self.reroute_tasks.lock().await;
        tasks.retain(|h| !h.is_finished());
        tasks.push(handle);
    }

    /// Wait for every reroute in flight to complete
    pub async fn wait_for_reroutes(&self) {
        let handles: Vec<JoinHandle<()>> = std::mem::take(&mut *self.reroute_tasks.lock().await);
        for handle in handles {
            if let Err(e) = handle.await {
                warn!(error = %e, "Reroute task failed");
            }
        }
    }

    /// Announce an ETA now if the throttle allows it
    ///
    /// Time is measured on the fix clock: the latest fix timestamp plus the
    /// time elapsed since that fix was handled.
    pub async fn poll_eta(&self) -> Option<Announcement> {
        self.shared.poll_eta().await
    }

    /// Final announcement, `Arrived` event, then stop
    ///
    /// Returns false if no session was active.
    pub async fn arrive(&self) -> bool {
        let (session_id, speak) = {
            let session = self.shared.session.lock().await;
            if !session.is_active() {
                return false;
            }
            (session.id(), session.settings().announcements_enabled)
        };

        info!(%session_id, "Destination reached");
        if speak {
            self.shared.announce(Announcement::Arrival);
        }
        self.shared.event_bus.emit_lossy(NavEvent::Arrived {
            session_id,
            timestamp: chrono::Utc::now(),
        });

        self.stop().await
    }

    /// Consume a position stream until arrival, stop, or end of stream
    ///
    /// An unavailable position source is surfaced once, stops the session and
    /// ends the loop without error.
    pub async fn run(&self, mut positions: mpsc::Receiver<PositionEvent>) -> Result<()> {
        while let Some(event) = positions.recv().await {
            match event {
                PositionEvent::Fix(fix) => match self.handle_fix(fix).await {
                    Ok(report) if report.arrived => {
                        self.arrive().await;
                        break;
                    }
                    Ok(_) => {}
                    Err(Error::InvalidState(reason)) => {
                        debug!(reason = %reason, "Fix ignored");
                        if self.state().await == SessionState::Stopped {
                            break;
                        }
                    }
                    Err(e) => warn!(error = %e, "Skipping fix"),
                },
                PositionEvent::Unavailable(reason) => {
                    warn!(reason = %reason, "Position source unavailable, tracking not started");
                    self.shared
                        .outputs
                        .notify("Location unavailable", &reason, Severity::Error);
                    self.shared
                        .event_bus
                        .emit_lossy(NavEvent::PositionUnavailable {
                            reason,
                            timestamp: chrono::Utc::now(),
                        });
                    self.stop().await;
                    break;
                }
            }
        }

        Ok(())
    }
}
