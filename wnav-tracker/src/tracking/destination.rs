//! Remaining-distance announcements with hysteresis
//!
//! A threshold fires when the remaining distance is at or below it and the
//! reference distance (remaining distance at the last announcement) was more
//! than 100 m above it. The reference only moves when something fires, so
//! jitter around a boundary cannot re-arm it. Going back beyond 11 km resets
//! the reference to infinity.

use tracing::{debug, warn};
use wnav_common::events::Announcement;

/// Hysteresis band above each threshold
pub const HYSTERESIS_M: f64 = 100.0;

/// Remaining distance beyond which all thresholds re-arm
pub const DEFAULT_RESET_DISTANCE_M: f64 = 11_000.0;

/// Fires destination-distance announcements
#[derive(Debug, Clone)]
pub struct DestinationAnnouncer {
    /// Thresholds, sorted descending
    thresholds_m: Vec<f64>,
    reset_distance_m: f64,
    /// Remaining distance recorded at the last announcement
    reference_m: f64,
}

impl DestinationAnnouncer {
    /// Create an announcer for the given thresholds (any order)
    ///
    /// The reset distance is 11 km, or 1 km beyond the largest threshold
    /// when that is larger.
    pub fn new(thresholds_m: &[f64]) -> Self {
        let mut thresholds: Vec<f64> = thresholds_m.iter().copied().filter(|t| t.is_finite() && *t > 0.0).collect();
        thresholds.sort_by(|a, b| b.total_cmp(a));
        let largest = thresholds.first().copied().unwrap_or(0.0);
        Self {
            reset_distance_m: DEFAULT_RESET_DISTANCE_M.max(largest + 1_000.0),
            thresholds_m: thresholds,
            reference_m: f64::INFINITY,
        }
    }

    /// Re-arm every threshold (new route or new leg)
    pub fn reset(&mut self) {
        self.reference_m = f64::INFINITY;
    }

    pub fn reference_m(&self) -> f64 {
        self.reference_m
    }

    /// Feed the latest remaining distance; returns the announcement to make, if any
    ///
    /// When one update crosses several thresholds at once only the tightest
    /// one is announced.
    pub fn update(&mut self, remaining_m: f64) -> Option<Announcement> {
        if !remaining_m.is_finite() || remaining_m < 0.0 {
            warn!(remaining_m, "Skipping destination announcement: invalid distance");
            return None;
        }

        if remaining_m > self.reset_distance_m {
            self.reference_m = f64::INFINITY;
            return None;
        }

        let reference = self.reference_m;
        let threshold = self
            .thresholds_m
            .iter()
            .rev()
            .copied()
            .find(|t| remaining_m <= *t && reference > *t + HYSTERESIS_M)?;

        self.reference_m = remaining_m;
        debug!(remaining_m, threshold_m = threshold, "Destination threshold fired");

        Some(Announcement::Destination {
            remaining_m,
            threshold_m: threshold,
        })
    }
}
