//! Navigation session
//!
//! [`NavigationSession`] is the synchronous core: it owns the active route,
//! every announcement state machine, the deviation debounce and the position
//! history, and turns one fix into a [`FixReport`]. It performs no I/O and
//! reads time only from fix timestamps, so a recorded trip always replays
//! the same way.
//!
//! [`NavigationSessionController`] wraps it for async use: it dispatches
//! reports to the outputs, runs reroutes and owns the refresh timers.
//!
//! # Generation counter
//!
//! Every route change and every start/stop bumps `generation`. A reroute
//! captures the generation at trigger time and is applied only if it still
//! matches when the response arrives.

mod controller;
pub mod timers;

pub use controller::{DeferredUpdate, NavigationSessionController};

use crate::config::SessionSettings;
use crate::error::{Error, Result};
use crate::tracking::deviation::{DeviationCheck, DeviationMonitor};
use crate::tracking::destination::DestinationAnnouncer;
use crate::tracking::eta::EtaAnnouncer;
use crate::tracking::matcher::{MatchResult, RouteMatcher};
use crate::tracking::position::{PositionFix, PositionHistory};
use crate::tracking::route::{ActiveRoute, Destination, TravelMode};
use crate::tracking::turn::{find_next_turn, TurnAnnouncer, TurnPhase, UpcomingTurn};
use crate::tracking::zoom::{ZoomChange, ZoomController};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;
use wnav_common::events::{Announcement, SessionState};
use wnav_common::LatLng;

/// Everything needed to run one reroute outside the session lock
#[derive(Debug, Clone, PartialEq)]
pub struct RerouteTicket {
    /// Session generation when the reroute was triggered
    pub generation: u64,
    /// Current position, the new route's origin
    pub origin: LatLng,
    pub destination: Destination,
    pub mode: TravelMode,
    pub distance_to_route_m: f64,
}

/// Outcome of processing one fix
#[derive(Debug, Clone, PartialEq)]
pub struct FixReport {
    pub position: LatLng,
    pub matched: MatchResult,
    pub upcoming_turn: Option<UpcomingTurn>,
    /// Announcements to speak, in firing order
    pub announcements: Vec<Announcement>,
    pub zoom: Option<ZoomChange>,
    pub reroute: Option<RerouteTicket>,
    /// Remaining distance fell within the arrival radius
    pub arrived: bool,
}

/// State of one navigation session
#[derive(Debug)]
pub struct NavigationSession {
    id: Uuid,
    settings: SessionSettings,
    state: SessionState,
    route: Option<Arc<ActiveRoute>>,
    current_match: Option<MatchResult>,
    history: PositionHistory,
    matcher: RouteMatcher,
    deviation: DeviationMonitor,
    turns: TurnAnnouncer,
    destination: DestinationAnnouncer,
    eta: EtaAnnouncer,
    zoom: ZoomController,
    generation: u64,
}

impl NavigationSession {
    pub fn new(settings: SessionSettings) -> Self {
        Self {
            id: Uuid::new_v4(),
            history: PositionHistory::new(settings.position_history_len),
            matcher: RouteMatcher::new(),
            deviation: DeviationMonitor::new(settings.deviation_threshold_m, settings.reroute_debounce_ms),
            turns: TurnAnnouncer::new(&settings.turn_thresholds_m),
            destination: DestinationAnnouncer::new(&settings.destination_thresholds_m),
            eta: EtaAnnouncer::new(),
            zoom: ZoomController::new(),
            settings,
            state: SessionState::Stopped,
            route: None,
            current_match: None,
            generation: 0,
        }
    }

    /// Session id; a new one is assigned on every start
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == SessionState::Active
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    /// Snapshot of the active route
    pub fn route(&self) -> Option<Arc<ActiveRoute>> {
        self.route.clone()
    }

    pub fn current_match(&self) -> Option<MatchResult> {
        self.current_match
    }

    pub fn history(&self) -> &PositionHistory {
        &self.history
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn turn_phase(&self) -> &TurnPhase {
        self.turns.phase()
    }

    /// Fix-clock time of the last ETA announcement
    pub fn eta_last_announcement_ms(&self) -> Option<i64> {
        self.eta.last_announcement_ms()
    }

    /// Enter `Starting` with `route`; all announcement state starts fresh
    ///
    /// # Errors
    ///
    /// [`Error::InvalidState`] unless the session is stopped.
    pub fn start(&mut self, route: ActiveRoute) -> Result<()> {
        if self.state != SessionState::Stopped {
            return Err(Error::InvalidState(format!(
                "cannot start navigation while {}",
                self.state
            )));
        }

        self.id = Uuid::new_v4();
        self.route = Some(route.shared());
        self.current_match = None;
        self.history.clear();
        self.deviation = DeviationMonitor::new(self.settings.deviation_threshold_m, self.settings.reroute_debounce_ms);
        self.zoom.reset();
        self.reset_announcements();
        self.generation += 1;
        self.state = SessionState::Starting;
        Ok(())
    }

    /// `Starting` to `Active`; false if the session was stopped in between
    pub fn mark_active(&mut self) -> bool {
        if self.state != SessionState::Starting {
            return false;
        }
        self.state = SessionState::Active;
        true
    }

    /// Tear down; returns false if already stopped
    pub fn stop(&mut self) -> bool {
        if self.state == SessionState::Stopped {
            return false;
        }
        self.state = SessionState::Stopped;
        self.route = None;
        self.current_match = None;
        self.history.clear();
        self.reset_announcements();
        self.zoom.reset();
        self.generation += 1;
        true
    }

    /// True while a reroute triggered at `generation` may still be applied
    pub fn is_current(&self, generation: u64) -> bool {
        self.is_active() && self.generation == generation
    }

    /// Replace the active route with a reroute result
    ///
    /// Returns false, leaving everything untouched, when the session stopped or
    /// the route changed since the reroute was triggered.
    pub fn apply_reroute(&mut self, generation: u64, route: ActiveRoute) -> bool {
        if !self.is_current(generation) {
            debug!(
                ticket_generation = generation,
                session_generation = self.generation,
                "Discarding stale reroute result"
            );
            return false;
        }

        info!(route_id = %route.id, distance_m = route.distance_m, "Active route replaced");
        self.route = Some(route.shared());
        self.current_match = None;
        self.reset_announcements();
        self.generation += 1;
        true
    }

    fn reset_announcements(&mut self) {
        self.turns.reset();
        self.destination.reset();
        self.eta.reset();
    }

    /// Process one position fix
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidState`] if the session is not active
    /// - [`Error::InvalidFix`] for a fix with an unusable coordinate
    pub fn process_fix(&mut self, fix: &PositionFix) -> Result<FixReport> {
        if !self.is_active() {
            return Err(Error::InvalidState(format!("session is {}", self.state)));
        }
        let route = self
            .route
            .clone()
            .ok_or_else(|| Error::InvalidState("active session without route".to_string()))?;
        if !fix.is_valid() {
            return Err(Error::InvalidFix(format!(
                "({}, {}) at {}",
                fix.latitude, fix.longitude, fix.timestamp
            )));
        }

        let position = fix.position();
        self.history.push(fix);

        let matched = self.matcher.match_fix(fix, &route.polyline);
        self.current_match = Some(matched);

        let reroute = match self.deviation.check(matched.distance_to_route_m, fix.timestamp) {
            DeviationCheck::Trigger => {
                info!(
                    distance_to_route_m = matched.distance_to_route_m,
                    generation = self.generation,
                    "Off route, triggering reroute"
                );
                Some(RerouteTicket {
                    generation: self.generation,
                    origin: position,
                    destination: route.destination.clone(),
                    mode: route.mode,
                    distance_to_route_m: matched.distance_to_route_m,
                })
            }
            DeviationCheck::OnRoute | DeviationCheck::Debounced { .. } => None,
        };

        let upcoming_turn = find_next_turn(&route.polyline, &position, matched.closest_index);

        let mut announcements = Vec::new();
        if self.settings.announcements_enabled {
            announcements.extend(self.turns.update(upcoming_turn.as_ref()));
            announcements.extend(self.destination.update(matched.remaining_distance_m));
            announcements.extend(self.eta.update(&self.history, matched.remaining_distance_m, fix.timestamp));
        }

        let turn_distance = upcoming_turn.filter(|t| t.is_turn).map(|t| t.distance_m);
        let zoom = self.zoom.update(fix.speed_kmh().unwrap_or(0.0), turn_distance);

        let radius = self.settings.arrival_radius_m;
        let arrived = matched.remaining_distance_m <= radius && matched.distance_to_route_m <= radius;

        Ok(FixReport {
            position,
            matched,
            upcoming_turn,
            announcements,
            zoom,
            reroute,
            arrived,
        })
    }

    /// ETA announcement from the latest match, for the ETA polling timer
    ///
    /// Time stays on the fix clock: "now" is the latest fix timestamp plus
    /// `since_last_fix_ms` (negative values count as zero), so polls and
    /// fixes throttle against the same timeline even when replaying an old
    /// recording.
    pub fn poll_eta(&mut self, since_last_fix_ms: i64) -> Option<Announcement> {
        if !self.is_active() || !self.settings.announcements_enabled {
            return None;
        }
        let matched = self.current_match?;
        let now_ms = self.history.latest()?.timestamp.saturating_add(since_last_fix_ms.max(0));
        self.eta.update(&self.history, matched.remaining_distance_m, now_ms)
    }
}
