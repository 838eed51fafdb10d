//! Off-route detection with debounced reroute triggering
//!
//! The debounce timestamp moves when a reroute is *triggered*, never when it
//! completes, so slow network responses cannot cause overlapping reroutes.
//! A failed reroute therefore waits the full debounce window from the
//! failed trigger before the next attempt.

use tracing::debug;

/// Outcome of one deviation check
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DeviationCheck {
    /// Within tolerance of the route
    OnRoute,
    /// Off route, but a reroute was triggered less than a debounce window ago
    Debounced { elapsed_ms: i64 },
    /// Off route and a reroute should be started now
    Trigger,
}

/// Watches distance-to-route and decides when to reroute
#[derive(Debug, Clone)]
pub struct DeviationMonitor {
    threshold_m: f64,
    debounce_ms: i64,
    /// Time of the last reroute trigger (epoch ms)
    last_trigger_ms: Option<i64>,
}

impl DeviationMonitor {
    pub fn new(threshold_m: f64, debounce_ms: u64) -> Self {
        Self {
            threshold_m,
            debounce_ms: i64::try_from(debounce_ms).unwrap_or(i64::MAX),
            last_trigger_ms: None,
        }
    }

    /// Check one match result
    ///
    /// Records the trigger time when returning [`DeviationCheck::Trigger`].
    /// Non-finite distances are treated as on-route.
    pub fn check(&mut self, distance_to_route_m: f64, now_ms: i64) -> DeviationCheck {
        if !distance_to_route_m.is_finite() || distance_to_route_m <= self.threshold_m {
            return DeviationCheck::OnRoute;
        }

        if let Some(last) = self.last_trigger_ms {
            let elapsed_ms = now_ms.saturating_sub(last);
            if elapsed_ms < self.debounce_ms {
                debug!(
                    distance_to_route_m,
                    elapsed_ms, "Off route, reroute debounced"
                );
                return DeviationCheck::Debounced { elapsed_ms };
            }
        }

        self.last_trigger_ms = Some(now_ms);
        DeviationCheck::Trigger
    }

    /// Time of the most recent trigger
    pub fn last_trigger_ms(&self) -> Option<i64> {
        self.last_trigger_ms
    }

    pub fn threshold_m(&self) -> f64 {
        self.threshold_m
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_on_route_never_triggers() {
        let mut monitor = DeviationMonitor::new(50.0, 5_000);
        assert_eq!(monitor.check(10.0, 0), DeviationCheck::OnRoute);
        assert_eq!(monitor.check(50.0, 1_000), DeviationCheck::OnRoute);
        assert_eq!(monitor.last_trigger_ms(), None);
    }

    #[test]
    fn test_events_3s_apart_trigger_once() {
        let mut monitor = DeviationMonitor::new(50.0, 5_000);
        assert_eq!(monitor.check(80.0, 10_000), DeviationCheck::Trigger);
        assert_eq!(
            monitor.check(80.0, 13_000),
            DeviationCheck::Debounced { elapsed_ms: 3_000 }
        );
    }

    #[test]
    fn test_events_6s_apart_trigger_twice() {
        let mut monitor = DeviationMonitor::new(50.0, 5_000);
        assert_eq!(monitor.check(80.0, 10_000), DeviationCheck::Trigger);
        assert_eq!(monitor.check(80.0, 16_000), DeviationCheck::Trigger);
        assert_eq!(monitor.last_trigger_ms(), Some(16_000));
    }

    #[test]
    fn test_debounce_counts_from_trigger_not_completion() {
        let mut monitor = DeviationMonitor::new(50.0, 5_000);
        assert_eq!(monitor.check(80.0, 0), DeviationCheck::Trigger);
        // Still off route while the (possibly failed) request is in flight
        assert!(matches!(monitor.check(90.0, 4_999), DeviationCheck::Debounced { .. }));
        assert_eq!(monitor.check(90.0, 5_000), DeviationCheck::Trigger);
    }

    #[test]
    fn test_nan_distance_is_ignored() {
        let mut monitor = DeviationMonitor::new(50.0, 5_000);
        assert_eq!(monitor.check(f64::NAN, 0), DeviationCheck::OnRoute);
    }

    #[test]
    fn test_clock_going_backwards_stays_debounced() {
        let mut monitor = DeviationMonitor::new(50.0, 5_000);
        assert_eq!(monitor.check(80.0, 10_000), DeviationCheck::Trigger);
        assert!(matches!(monitor.check(80.0, 9_000), DeviationCheck::Debounced { .. }));
    }
}
