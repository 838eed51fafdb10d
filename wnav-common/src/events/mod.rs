//! Event types for the WNAV event system
//!
//! Provides shared event definitions and the EventBus used by the tracking
//! engine to publish session activity to any number of listeners.

mod nav_types;

pub use nav_types::{format_distance, Announcement, RefreshKind, SessionState, Severity, TurnDirection};

use crate::geo::LatLng;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// WNAV event types
///
/// Events are broadcast via EventBus and serialize with a `type` tag so they
/// can be forwarded unchanged to UI or logging sinks.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum NavEvent {
    /// Navigation session became active
    SessionStarted {
        session_id: Uuid,
        route_id: Uuid,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Navigation session was stopped (user stop, arrival or shutdown)
    SessionStopped {
        session_id: Uuid,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A position fix was matched against the active route
    ///
    /// Emitted once per processed fix.
    ProgressUpdated {
        closest_index: usize,
        distance_to_route_m: f64,
        remaining_distance_m: f64,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// An announcement fired
    AnnouncementIssued {
        announcement: Announcement,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// The fix drifted off route and a new route calculation was triggered
    RerouteRequested {
        origin: LatLng,
        distance_to_route_m: f64,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A new route replaced the active route
    RerouteApplied {
        route_id: Uuid,
        distance_m: f64,
        duration_s: f64,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Route recalculation failed; the previous route stays active
    RerouteFailed {
        message: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Camera zoom level changed
    ZoomChanged {
        old_level: Option<u8>,
        new_level: u8,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A periodic refresh timer fired
    RefreshDue {
        kind: RefreshKind,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// The position source cannot deliver fixes (unsupported or denied)
    PositionUnavailable {
        reason: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Destination reached
    Arrived {
        session_id: Uuid,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl NavEvent {
    /// Event type name as used in the serialized `type` tag
    pub fn event_type(&self) -> &'static str {
        match self {
            NavEvent::SessionStarted { .. } => "SessionStarted",
            NavEvent::SessionStopped { .. } => "SessionStopped",
            NavEvent::ProgressUpdated { .. } => "ProgressUpdated",
            NavEvent::AnnouncementIssued { .. } => "AnnouncementIssued",
            NavEvent::RerouteRequested { .. } => "RerouteRequested",
            NavEvent::RerouteApplied { .. } => "RerouteApplied",
            NavEvent::RerouteFailed { .. } => "RerouteFailed",
            NavEvent::ZoomChanged { .. } => "ZoomChanged",
            NavEvent::RefreshDue { .. } => "RefreshDue",
            NavEvent::PositionUnavailable { .. } => "PositionUnavailable",
            NavEvent::Arrived { .. } => "Arrived",
        }
    }
}

// ========================================
// EventBus Implementation
// ========================================

/// Central event distribution bus
///
/// Uses tokio::broadcast internally, providing:
/// - Non-blocking publish (slow subscribers don't block producers)
/// - Multiple concurrent subscribers
/// - Lagged message detection for slow subscribers
///
/// # Examples
///
/// ```
/// use wnav_common::events::{EventBus, NavEvent};
///
/// let event_bus = EventBus::new(100);
/// let mut rx = event_bus.subscribe();
///
/// event_bus.emit_lossy(NavEvent::RerouteFailed {
///     message: "offline".to_string(),
///     timestamp: chrono::Utc::now(),
/// });
///
/// assert!(rx.try_recv().is_ok());
/// ```
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<NavEvent>,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> broadcast::Receiver<NavEvent> {
        self.tx.subscribe()
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: NavEvent) {
        let _ = self.tx.send(event);
    }

    /// Get the current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
