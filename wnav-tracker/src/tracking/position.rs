//! Position fixes and the bounded position history
//!
//! Fixes arrive at whatever cadence the position provider chooses. Speed and
//! accuracy may be missing, and some providers report negative or garbage
//! speed values; consumers must sanitize before use.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use wnav_common::LatLng;

/// One reported device position
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionFix {
    pub latitude: f64,
    pub longitude: f64,
    /// Ground speed as reported by the provider
    #[serde(default)]
    pub speed_meters_per_second: Option<f64>,
    /// Horizontal accuracy radius
    #[serde(default)]
    pub accuracy_meters: Option<f64>,
    /// Milliseconds since the Unix epoch
    pub timestamp: i64,
}

impl PositionFix {
    pub fn new(latitude: f64, longitude: f64, timestamp: i64) -> Self {
        Self {
            latitude,
            longitude,
            speed_meters_per_second: None,
            accuracy_meters: None,
            timestamp,
        }
    }

    pub fn with_speed(mut self, speed_mps: f64) -> Self {
        self.speed_meters_per_second = Some(speed_mps);
        self
    }

    pub fn with_accuracy(mut self, accuracy_m: f64) -> Self {
        self.accuracy_meters = Some(accuracy_m);
        self
    }

    pub fn position(&self) -> LatLng {
        LatLng::new(self.latitude, self.longitude)
    }

    /// True when the coordinate is usable for matching
    pub fn is_valid(&self) -> bool {
        self.position().is_valid()
    }

    /// Reported speed in km/h, if present, finite and non-negative
    pub fn speed_kmh(&self) -> Option<f64> {
        self.speed_meters_per_second
            .filter(|s| s.is_finite() && *s >= 0.0)
            .map(|s| s * 3.6)
    }
}

/// What a position source can deliver
#[derive(Debug, Clone, PartialEq)]
pub enum PositionEvent {
    Fix(PositionFix),
    /// Geolocation unsupported or permission denied
    Unavailable(String),
}

/// Entry of the position history
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistoryEntry {
    pub position: LatLng,
    /// Speed sample in km/h as stored at ingestion, unsanitized
    pub speed_kmh: Option<f64>,
    pub timestamp: i64,
}

/// Bounded ring buffer of the most recent fixes
#[derive(Debug, Clone)]
pub struct PositionHistory {
    entries: VecDeque<HistoryEntry>,
    capacity: usize,
}

impl PositionHistory {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a fix, evicting the oldest entry when full
    pub fn push(&mut self, fix: &PositionFix) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(HistoryEntry {
            position: fix.position(),
            speed_kmh: fix.speed_meters_per_second.map(|s| s * 3.6),
            timestamp: fix.timestamp,
        });
    }

    /// Oldest to newest
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    pub fn latest(&self) -> Option<&HistoryEntry> {
        self.entries.back()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
