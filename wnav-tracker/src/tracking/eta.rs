//! Rolling speed estimate and throttled ETA announcements
//!
//! # Speed estimate
//!
//! Average of the last five history samples in km/h. A sample below 1 is
//! taken to be a raw m/s value that slipped through unconverted and is
//! multiplied by 3.6. Samples outside (0, 200) km/h are dropped, the mean is
//! clamped to [5, 200] km/h, and 40 km/h is used when no sample survives.
//!
//! # Throttling
//!
//! An ETA is announced when 10 minutes passed since the last one, or when it
//! moved by more than 5 minutes and at least 1 minute passed since the last
//! one.

use crate::tracking::position::PositionHistory;
use tracing::{debug, warn};
use wnav_common::events::Announcement;
use wnav_common::time::millis_to_datetime;

/// Samples used for the rolling average
pub const SPEED_WINDOW: usize = 5;
/// Fallback speed when no usable sample exists
pub const DEFAULT_SPEED_KMH: f64 = 40.0;
pub const MIN_SPEED_KMH: f64 = 5.0;
pub const MAX_SPEED_KMH: f64 = 200.0;

/// ETAs beyond this are implausible and discarded
pub const MAX_ETA_MS: i64 = 24 * 60 * 60 * 1000;

/// Regular announcement period
pub const ANNOUNCE_INTERVAL_MS: i64 = 600_000;
/// ETA change that justifies an early announcement
pub const SIGNIFICANT_CHANGE_MS: i64 = 300_000;
/// Hard floor between two announcements
pub const MIN_GAP_MS: i64 = 60_000;

/// Rolling average speed in km/h from the most recent history entries
pub fn rolling_speed_kmh(history: &PositionHistory) -> f64 {
    let samples: Vec<f64> = history
        .iter()
        .rev()
        .take(SPEED_WINDOW)
        .filter_map(|entry| entry.speed_kmh)
        .filter(|s| s.is_finite())
        .map(|s| if s < 1.0 { s * 3.6 } else { s })
        .filter(|s| *s > 0.0 && *s < MAX_SPEED_KMH)
        .collect();

    if samples.is_empty() {
        return DEFAULT_SPEED_KMH;
    }

    let mean = samples.iter().sum::<f64>() / samples.len() as f64;
    mean.clamp(MIN_SPEED_KMH, MAX_SPEED_KMH)
}

/// Travel time in milliseconds for `remaining_m` at `speed_kmh`
///
/// Returns `None` for invalid input or ETAs beyond 24 hours.
pub fn estimate_eta_ms(remaining_m: f64, speed_kmh: f64) -> Option<i64> {
    if !remaining_m.is_finite() || remaining_m < 0.0 || !speed_kmh.is_finite() || speed_kmh <= 0.0 {
        return None;
    }

    let eta = (remaining_m / 1000.0) / speed_kmh * 3_600_000.0;
    if eta > MAX_ETA_MS as f64 {
        return None;
    }
    Some(eta.round() as i64)
}

/// Throttled ETA announcer
#[derive(Debug, Clone, Default)]
pub struct EtaAnnouncer {
    last_announcement_ms: Option<i64>,
    last_announced_eta_ms: Option<i64>,
}

impl EtaAnnouncer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget announcement history (new route)
    pub fn reset(&mut self) {
        self.last_announcement_ms = None;
        self.last_announced_eta_ms = None;
    }

    pub fn last_announcement_ms(&self) -> Option<i64> {
        self.last_announcement_ms
    }

    pub fn last_announced_eta_ms(&self) -> Option<i64> {
        self.last_announced_eta_ms
    }

    /// Decide whether an ETA of `eta_ms` should be announced at `now_ms`
    pub fn should_announce(&self, eta_ms: i64, now_ms: i64) -> bool {
        let Some(last) = self.last_announcement_ms else {
            return true;
        };
        let elapsed = now_ms.saturating_sub(last);
        if elapsed >= ANNOUNCE_INTERVAL_MS {
            return true;
        }

        let changed_by = self
            .last_announced_eta_ms
            .map(|prev| (eta_ms - prev).abs())
            .unwrap_or(i64::MAX);
        changed_by > SIGNIFICANT_CHANGE_MS && elapsed >= MIN_GAP_MS
    }

    /// Compute the ETA from the history and remaining distance, announcing it if due
    pub fn update(&mut self, history: &PositionHistory, remaining_m: f64, now_ms: i64) -> Option<Announcement> {
        let speed_kmh = rolling_speed_kmh(history);
        let Some(eta_ms) = estimate_eta_ms(remaining_m, speed_kmh) else {
            warn!(remaining_m, speed_kmh, "Skipping ETA announcement: implausible estimate");
            return None;
        };

        self.update_with_eta(eta_ms, now_ms)
    }

    /// Announce an already computed ETA if due
    pub fn update_with_eta(&mut self, eta_ms: i64, now_ms: i64) -> Option<Announcement> {
        if !self.should_announce(eta_ms, now_ms) {
            return None;
        }

        self.last_announcement_ms = Some(now_ms);
        self.last_announced_eta_ms = Some(eta_ms);
        debug!(eta_ms, "ETA announcement fired");

        Some(Announcement::Eta {
            eta_ms,
            arrival_at: millis_to_datetime(now_ms.saturating_add(eta_ms)),
        })
    }
}
