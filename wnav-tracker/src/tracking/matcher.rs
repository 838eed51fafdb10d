//! Route matching
//!
//! Matches a fix to the nearest vertex of the active route by linear scan.
//! O(n) per fix, which is fine for routes of a few thousand vertices. Larger
//! polylines would want a grid or k-d tree behind the same `match_fix` call.
//!
//! The match is recomputed from scratch every fix and is NOT monotonic: GPS
//! noise can put the closest vertex behind the previous match.

use crate::tracking::position::PositionFix;
use crate::tracking::route::RoutePolyline;
use serde::{Deserialize, Serialize};
use wnav_common::geo::haversine_m;
use wnav_common::LatLng;

/// Result of matching one fix against the route
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    /// Index of the nearest polyline vertex
    pub closest_index: usize,
    /// Great-circle distance from the fix to that vertex
    pub distance_to_route_m: f64,
    /// Along-route distance from that vertex to the final vertex
    pub remaining_distance_m: f64,
}

/// Nearest-vertex matcher
#[derive(Debug, Clone, Copy, Default)]
pub struct RouteMatcher;

impl RouteMatcher {
    pub fn new() -> Self {
        Self
    }

    /// Match a fix against the polyline
    pub fn match_fix(&self, fix: &PositionFix, polyline: &RoutePolyline) -> MatchResult {
        self.match_position(&fix.position(), polyline)
    }

    /// Match a raw coordinate against the polyline
    pub fn match_position(&self, position: &LatLng, polyline: &RoutePolyline) -> MatchResult {
        let mut closest_index = 0;
        let mut best = f64::INFINITY;

        for (i, vertex) in polyline.points().iter().enumerate() {
            let d = haversine_m(position, vertex);
            // Strict comparison keeps the earliest vertex on ties
            if d < best {
                best = d;
                closest_index = i;
            }
        }

        MatchResult {
            closest_index,
            distance_to_route_m: best,
            remaining_distance_m: polyline.remaining_from(closest_index),
        }
    }
}
