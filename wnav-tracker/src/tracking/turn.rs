//! Upcoming-turn detection and turn announcements
//!
//! # Turn lookahead
//!
//! From the approach anchor (see [`find_next_turn`]) the current heading is
//! the bearing of the anchor segment. Up to [`LOOKAHEAD_VERTICES`] following
//! segments are compared against it, and the vertex with the largest
//! absolute heading change above [`MIN_TURN_DELTA_DEG`] is the next turn.
//! If none qualifies the vertex five positions ahead is reported as a
//! straight continuation.
//!
//! # Announcement state machine
//!
//! ```text
//! Idle ──turn within reset distance──▶ Approaching{vertex}
//!  ▲                                        │
//!  │                    distance > reset    │
//!  └────────── Passed ◀─────────────────────┘
//! ```
//!
//! A threshold fires when `distance <= threshold`, `distance > threshold - 50`
//! and it has not fired yet for that turn vertex. Fired thresholds are kept
//! per vertex, so jitter that flips the lookahead between two neighbouring
//! turns does not repeat either one. A vertex is re-armed only once it is
//! reported beyond the reset distance, or when the route is replaced.

use crate::tracking::route::RoutePolyline;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, warn};
use wnav_common::events::{Announcement, TurnDirection};
use wnav_common::geo::{bearing_deg, bearing_delta_deg, distance_to_segment_m, haversine_m};
use wnav_common::LatLng;

/// Maximum number of segments inspected ahead of the anchor
pub const LOOKAHEAD_VERTICES: usize = 50;

/// Heading changes at or below this are not turns
pub const MIN_TURN_DELTA_DEG: f64 = 10.0;

/// Straight-continuation fallback offset
pub const STRAIGHT_FALLBACK_OFFSET: usize = 5;

/// Width of the band above a threshold in which it may fire
pub const ARMING_WINDOW_M: f64 = 50.0;

/// Distance beyond which a turn counts as passed
pub const DEFAULT_RESET_DISTANCE_M: f64 = 600.0;

/// Segments shorter than this have no meaningful bearing
const MIN_SEGMENT_M: f64 = 0.5;

/// The next heading change ahead of the fix
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UpcomingTurn {
    /// Polyline vertex where the heading changes
    pub vertex_index: usize,
    pub direction: TurnDirection,
    /// Signed heading change in [-180, 180], negative = left
    pub delta_deg: f64,
    /// Direct-line distance from the fix to the vertex
    pub distance_m: f64,
    /// False for the straight-continuation fallback
    pub is_turn: bool,
}

/// Locate the next turn ahead of `position`
///
/// The approach anchor is `closest_index`, except when the fix lies nearer
/// to the segment leading into the closest vertex than to the one leaving
/// it: then the anchor is the previous vertex, so the heading reflects the
/// segment being driven rather than the one after the turn.
///
/// Returns `None` on single-vertex routes. On the last leg the final vertex
/// is reported as a straight continuation.
pub fn find_next_turn(polyline: &RoutePolyline, position: &LatLng, closest_index: usize) -> Option<UpcomingTurn> {
    let points = polyline.points();
    let n = points.len();
    if n < 2 {
        return None;
    }

    let closest = closest_index.min(n - 1);
    let mut anchor = closest;
    if anchor > 0 {
        let incoming = distance_to_segment_m(position, &points[anchor - 1], &points[anchor]);
        let outgoing = if anchor + 1 < n {
            distance_to_segment_m(position, &points[anchor], &points[anchor + 1])
        } else {
            f64::INFINITY
        };
        if incoming < outgoing {
            anchor -= 1;
        }
    }

    if anchor >= n - 1 {
        return None;
    }

    let current_bearing = bearing_deg(&points[anchor], &points[anchor + 1]);
    let scan_end = (anchor + 1 + LOOKAHEAD_VERTICES).min(n - 1);

    let mut best: Option<(usize, f64)> = None;
    for j in (anchor + 1)..scan_end {
        if haversine_m(&points[j], &points[j + 1]) < MIN_SEGMENT_M {
            continue;
        }
        let delta = bearing_delta_deg(current_bearing, bearing_deg(&points[j], &points[j + 1]));
        if delta.abs() > MIN_TURN_DELTA_DEG && best.map_or(true, |(_, b)| delta.abs() > b.abs()) {
            best = Some((j, delta));
        }
    }

    let turn = match best {
        Some((vertex_index, delta_deg)) => UpcomingTurn {
            vertex_index,
            direction: TurnDirection::from_delta(delta_deg),
            delta_deg,
            distance_m: haversine_m(position, &points[vertex_index]),
            is_turn: true,
        },
        None => {
            let vertex_index = (closest + STRAIGHT_FALLBACK_OFFSET).min(n - 1);
            UpcomingTurn {
                vertex_index,
                direction: TurnDirection::Straight,
                delta_deg: 0.0,
                distance_m: haversine_m(position, &points[vertex_index]),
                is_turn: false,
            }
        }
    };

    Some(turn)
}

/// Turn announcement state per approach
#[derive(Debug, Clone, PartialEq)]
pub enum TurnPhase {
    /// No turn being approached
    Idle,
    /// Inside the reset distance of a turn
    Approaching { vertex_index: usize },
    /// Turn left behind; the next turn starts a fresh approach
    Passed { vertex_index: usize },
}

/// Fires turn announcements at distance thresholds, once per approach
#[derive(Debug, Clone)]
pub struct TurnAnnouncer {
    /// Thresholds, sorted descending
    thresholds_m: Vec<f64>,
    reset_distance_m: f64,
    phase: TurnPhase,
    /// Thresholds already announced, by turn vertex
    fired: HashMap<usize, Vec<f64>>,
}

impl TurnAnnouncer {
    /// Create an announcer for the given thresholds (any order)
    ///
    /// The reset distance is 600 m, or 100 m beyond the largest threshold
    /// when that is larger.
    pub fn new(thresholds_m: &[f64]) -> Self {
        let mut thresholds: Vec<f64> = thresholds_m.iter().copied().filter(|t| t.is_finite() && *t > 0.0).collect();
        thresholds.sort_by(|a, b| b.total_cmp(a));
        let largest = thresholds.first().copied().unwrap_or(0.0);
        Self {
            reset_distance_m: DEFAULT_RESET_DISTANCE_M.max(largest + 100.0),
            thresholds_m: thresholds,
            phase: TurnPhase::Idle,
            fired: HashMap::new(),
        }
    }

    pub fn phase(&self) -> &TurnPhase {
        &self.phase
    }

    /// Thresholds already fired for the turn at `vertex_index`
    pub fn fired_thresholds(&self, vertex_index: usize) -> &[f64] {
        self.fired.get(&vertex_index).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Forget all approach state (new route)
    pub fn reset(&mut self) {
        self.phase = TurnPhase::Idle;
        self.fired.clear();
    }

    /// Feed the latest lookahead result; returns the announcement to make, if any
    ///
    /// Straight continuations are never spoken and leave the approach state
    /// untouched.
    pub fn update(&mut self, turn: Option<&UpcomingTurn>) -> Option<Announcement> {
        let Some(turn) = turn else {
            self.phase = TurnPhase::Idle;
            return None;
        };

        if !turn.is_turn {
            return None;
        }

        if !turn.distance_m.is_finite() || turn.distance_m < 0.0 {
            warn!(distance_m = turn.distance_m, "Skipping turn announcement: invalid distance");
            return None;
        }

        if turn.distance_m > self.reset_distance_m {
            if self.fired.remove(&turn.vertex_index).is_some() {
                debug!(
                    vertex_index = turn.vertex_index,
                    distance_m = turn.distance_m,
                    "Turn passed, thresholds re-armed"
                );
            }
            if let TurnPhase::Approaching { vertex_index } = self.phase {
                self.phase = TurnPhase::Passed { vertex_index };
            }
            return None;
        }

        self.phase = TurnPhase::Approaching {
            vertex_index: turn.vertex_index,
        };
        let fired = self.fired.entry(turn.vertex_index).or_default();

        // Tightest armed threshold wins when windows overlap
        let threshold = self
            .thresholds_m
            .iter()
            .rev()
            .copied()
            .find(|t| {
                turn.distance_m <= *t && turn.distance_m > *t - ARMING_WINDOW_M && !fired.contains(t)
            })?;

        fired.push(threshold);
        debug!(
            vertex_index = turn.vertex_index,
            direction = %turn.direction,
            distance_m = turn.distance_m,
            threshold_m = threshold,
            "Turn threshold fired"
        );

        Some(Announcement::Turn {
            direction: turn.direction,
            distance_m: turn.distance_m,
            threshold_m: threshold,
        })
    }
}
