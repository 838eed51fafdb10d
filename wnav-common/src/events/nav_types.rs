//! Navigation-related type definitions
//!
//! Supporting types for announcements, turn classification and refresh timers.

use serde::{Deserialize, Serialize};

/// Turn classification by signed heading change
///
/// Buckets (delta in degrees, negative = left):
/// `< -135` sharp left, `< -45` left, `< -10` slight left, `<= 10` straight,
/// `<= 45` slight right, `<= 135` right, otherwise sharp right.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TurnDirection {
    SharpLeft,
    Left,
    SlightLeft,
    Straight,
    SlightRight,
    Right,
    SharpRight,
}

impl TurnDirection {
    /// Classify a signed heading change already normalized to [-180, 180]
    pub fn from_delta(delta_deg: f64) -> Self {
        if delta_deg < -135.0 {
            TurnDirection::SharpLeft
        } else if delta_deg < -45.0 {
            TurnDirection::Left
        } else if delta_deg < -10.0 {
            TurnDirection::SlightLeft
        } else if delta_deg <= 10.0 {
            TurnDirection::Straight
        } else if delta_deg <= 45.0 {
            TurnDirection::SlightRight
        } else if delta_deg <= 135.0 {
            TurnDirection::Right
        } else {
            TurnDirection::SharpRight
        }
    }

    /// Spoken instruction fragment
    pub fn instruction(&self) -> &'static str {
        match self {
            TurnDirection::SharpLeft => "turn sharp left",
            TurnDirection::Left => "turn left",
            TurnDirection::SlightLeft => "keep slightly left",
            TurnDirection::Straight => "continue straight",
            TurnDirection::SlightRight => "keep slightly right",
            TurnDirection::Right => "turn right",
            TurnDirection::SharpRight => "turn sharp right",
        }
    }
}

impl std::fmt::Display for TurnDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TurnDirection::SharpLeft => "sharp_left",
            TurnDirection::Left => "left",
            TurnDirection::SlightLeft => "slight_left",
            TurnDirection::Straight => "straight",
            TurnDirection::SlightRight => "slight_right",
            TurnDirection::Right => "right",
            TurnDirection::SharpRight => "sharp_right",
        };
        write!(f, "{}", s)
    }
}

/// A voice/visual announcement produced by the tracking engine
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Announcement {
    /// Upcoming turn within a distance threshold
    Turn {
        direction: TurnDirection,
        /// Direct-line distance from the fix to the turn vertex
        distance_m: f64,
        /// Threshold that armed this announcement
        threshold_m: f64,
    },

    /// Remaining distance to destination crossed a threshold
    Destination {
        remaining_m: f64,
        threshold_m: f64,
    },

    /// Estimated time of arrival update
    Eta {
        /// Estimated travel time remaining in milliseconds
        eta_ms: i64,
        /// Predicted arrival wall-clock time
        arrival_at: chrono::DateTime<chrono::Utc>,
    },

    /// A new route has been calculated after leaving the old one
    Reroute,

    /// Destination reached
    Arrival,
}

impl Announcement {
    /// Text handed to the voice output
    pub fn speech_text(&self) -> String {
        match self {
            Announcement::Turn {
                direction,
                distance_m,
                ..
            } => format!("In {}, {}", format_distance(*distance_m), direction.instruction()),
            Announcement::Destination { remaining_m, .. } => {
                format!("{} to your destination", format_distance(*remaining_m))
            }
            Announcement::Eta { eta_ms, arrival_at } => {
                let minutes = (*eta_ms as f64 / 60_000.0).round() as i64;
                format!(
                    "Estimated arrival in {} at {}",
                    format_minutes(minutes),
                    arrival_at.with_timezone(&chrono::Local).format("%H:%M")
                )
            }
            Announcement::Reroute => "Route recalculated".to_string(),
            Announcement::Arrival => "You have arrived at your destination".to_string(),
        }
    }
}

/// Format a distance for speech: tens of meters below 1 km, otherwise km with one decimal
pub fn format_distance(meters: f64) -> String {
    if meters >= 1000.0 {
        format!("{:.1} kilometers", meters / 1000.0)
    } else {
        format!("{} meters", ((meters / 10.0).round() as i64) * 10)
    }
}

fn format_minutes(minutes: i64) -> String {
    if minutes >= 60 {
        let hours = minutes / 60;
        let rest = minutes % 60;
        if rest == 0 {
            format!("{} h", hours)
        } else {
            format!("{} h {} min", hours, rest)
        }
    } else {
        format!("{} min", minutes.max(1))
    }
}

/// Periodic background refresh kinds owned by a navigation session
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RefreshKind {
    Traffic,
    Weather,
    Hazards,
    EtaPolling,
}

impl RefreshKind {
    /// All refresh kinds, in timer start order
    pub const ALL: [RefreshKind; 4] = [
        RefreshKind::Traffic,
        RefreshKind::Weather,
        RefreshKind::Hazards,
        RefreshKind::EtaPolling,
    ];
}

impl std::fmt::Display for RefreshKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RefreshKind::Traffic => write!(f, "traffic"),
            RefreshKind::Weather => write!(f, "weather"),
            RefreshKind::Hazards => write!(f, "hazards"),
            RefreshKind::EtaPolling => write!(f, "eta_polling"),
        }
    }
}

/// Notification severity
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// Navigation session lifecycle state
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Stopped,
    Starting,
    Active,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionState::Stopped => write!(f, "stopped"),
            SessionState::Starting => write!(f, "starting"),
            SessionState::Active => write!(f, "active"),
        }
    }
}
