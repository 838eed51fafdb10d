//! Speed- and maneuver-adaptive camera zoom

use tracing::debug;

/// Zoom used when a turn is close
pub const TURN_ZOOM: u8 = 18;
/// Turn proximity that switches to [`TURN_ZOOM`]
pub const TURN_ZOOM_DISTANCE_M: f64 = 500.0;

pub const MOTORWAY_ZOOM: u8 = 14;
pub const MAIN_ROAD_ZOOM: u8 = 15;
pub const URBAN_ZOOM: u8 = 16;
pub const SLOW_ZOOM: u8 = 17;

/// Camera animation length for zoom changes
pub const ZOOM_ANIMATION_S: f64 = 1.0;

/// Map speed and turn proximity to a zoom level
///
/// A turn closer than 500 m takes priority over speed.
pub fn zoom_level(speed_kmh: f64, distance_to_next_turn_m: Option<f64>) -> u8 {
    if let Some(d) = distance_to_next_turn_m {
        if d.is_finite() && d < TURN_ZOOM_DISTANCE_M {
            return TURN_ZOOM;
        }
    }

    if speed_kmh > 100.0 {
        MOTORWAY_ZOOM
    } else if speed_kmh > 50.0 {
        MAIN_ROAD_ZOOM
    } else if speed_kmh > 20.0 {
        URBAN_ZOOM
    } else {
        SLOW_ZOOM
    }
}

/// A camera move the caller should perform
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomChange {
    pub old_level: Option<u8>,
    pub new_level: u8,
    pub duration_s: f64,
}

/// Tracks the applied zoom level and suppresses no-op moves
#[derive(Debug, Clone, Default)]
pub struct ZoomController {
    applied: Option<u8>,
}

impl ZoomController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn applied_level(&self) -> Option<u8> {
        self.applied
    }

    pub fn reset(&mut self) {
        self.applied = None;
    }

    /// Returns a change only when the level differs from the applied one
    pub fn update(&mut self, speed_kmh: f64, distance_to_next_turn_m: Option<f64>) -> Option<ZoomChange> {
        let new_level = zoom_level(speed_kmh, distance_to_next_turn_m);
        if self.applied == Some(new_level) {
            return None;
        }

        let old_level = self.applied.replace(new_level);
        debug!(?old_level, new_level, speed_kmh, "Zoom level changed");
        Some(ZoomChange {
            old_level,
            new_level,
            duration_s: ZOOM_ANIMATION_S,
        })
    }
}
