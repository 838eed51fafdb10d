//! Deviation debounce and reroute application through the session controller

mod helpers;

use helpers::{drain_events, response_for, straight_route, RecordingNotifier, RecordingVoice, ScriptedRoutingClient};
use std::sync::Arc;
use tokio::sync::broadcast;
use wnav_common::events::{EventBus, NavEvent, SessionState, Severity};
use wnav_common::geo::destination_point;
use wnav_common::LatLng;
use wnav_tracker::config::SessionSettings;
use wnav_tracker::error::Error;
use wnav_tracker::outputs::Outputs;
use wnav_tracker::tracking::{PositionFix, RerouteCoordinator};
use wnav_tracker::NavigationSessionController;

const START: LatLng = LatLng::new(47.0, 8.0);

struct Harness {
    controller: NavigationSessionController,
    client: Arc<ScriptedRoutingClient>,
    voice: Arc<RecordingVoice>,
    notifier: Arc<RecordingNotifier>,
    events: broadcast::Receiver<NavEvent>,
}

async fn harness(client: Arc<ScriptedRoutingClient>) -> Harness {
    let voice = Arc::new(RecordingVoice::default());
    let notifier = Arc::new(RecordingNotifier::default());
    let outputs = Outputs {
        voice: Some(voice.clone()),
        notifier: Some(notifier.clone()),
        ..Outputs::default()
    };
    let bus = Arc::new(EventBus::new(1024));
    let events = bus.subscribe();
    let controller = NavigationSessionController::new(
        SessionSettings::default(),
        RerouteCoordinator::new(client.clone()),
        outputs,
        bus,
    );
    controller.start(straight_route(START, 2_000.0)).await.unwrap();

    Harness {
        controller,
        client,
        voice,
        notifier,
        events,
    }
}

fn off_route_position() -> LatLng {
    destination_point(&START, 90.0, 200.0)
}

fn off_route_fix(timestamp: i64) -> PositionFix {
    let p = off_route_position();
    PositionFix::new(p.lat, p.lng, timestamp)
}

fn network_error() -> wnav_tracker::Result<wnav_tracker::tracking::RouteResponse> {
    Err(Error::Network("connection refused".to_string()))
}

fn count<F: Fn(&NavEvent) -> bool>(events: &[NavEvent], pred: F) -> usize {
    events.iter().filter(|e| pred(e)).count()
}

#[tokio::test]
async fn test_deviations_3s_apart_reroute_once() {
    let h = harness(ScriptedRoutingClient::new(vec![network_error(), network_error()])).await;

    let first = h.controller.handle_fix(off_route_fix(10_000)).await.unwrap();
    let second = h.controller.handle_fix(off_route_fix(13_000)).await.unwrap();
    h.controller.wait_for_reroutes().await;

    assert!(first.reroute.is_some());
    assert!(second.reroute.is_none());
    assert_eq!(h.client.calls(), 1);
}

#[tokio::test]
async fn test_deviations_6s_apart_reroute_twice() {
    let h = harness(ScriptedRoutingClient::new(vec![network_error(), network_error()])).await;

    h.controller.handle_fix(off_route_fix(10_000)).await.unwrap();
    h.controller.wait_for_reroutes().await;
    h.controller.handle_fix(off_route_fix(16_000)).await.unwrap();
    h.controller.wait_for_reroutes().await;

    assert_eq!(h.client.calls(), 2);
    let requests = h.client.requests();
    assert_eq!(requests[0].origin, off_route_position());
}

#[tokio::test]
async fn test_failed_reroute_keeps_route_and_notifies() {
    let mut h = harness(ScriptedRoutingClient::new(vec![network_error()])).await;
    let route_before = h.controller.active_route().await.unwrap().id;

    h.controller.handle_fix(off_route_fix(10_000)).await.unwrap();
    h.controller.wait_for_reroutes().await;

    assert_eq!(h.controller.active_route().await.unwrap().id, route_before);
    assert_eq!(h.controller.state().await, SessionState::Active);

    let notifications = h.notifier.notifications();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].2, Severity::Warning);
    assert!(notifications[0].1.contains("connection refused"));

    let events = drain_events(&mut h.events);
    assert_eq!(count(&events, |e| matches!(e, NavEvent::RerouteRequested { .. })), 1);
    assert_eq!(count(&events, |e| matches!(e, NavEvent::RerouteFailed { .. })), 1);
    assert_eq!(count(&events, |e| matches!(e, NavEvent::RerouteApplied { .. })), 0);
}

#[tokio::test]
async fn test_successful_reroute_replaces_route() {
    let destination = destination_point(&START, 0.0, 2_000.0);
    let response = response_for(&[off_route_position(), destination]);
    let mut h = harness(ScriptedRoutingClient::new(vec![Ok(response)])).await;
    let route_before = h.controller.active_route().await.unwrap();
    let generation_before = h.controller.generation().await;

    h.controller.handle_fix(off_route_fix(10_000)).await.unwrap();
    h.controller.wait_for_reroutes().await;

    let route_after = h.controller.active_route().await.unwrap();
    assert_ne!(route_after.id, route_before.id);
    assert_eq!(route_after.polyline.len(), 2);
    assert_eq!(route_after.destination, route_before.destination);
    assert_eq!(h.controller.generation().await, generation_before + 1);

    assert!(h.voice.spoken().iter().any(|s| s == "Route recalculated"));
    let events = drain_events(&mut h.events);
    assert_eq!(count(&events, |e| matches!(e, NavEvent::RerouteApplied { .. })), 1);

    // The new route starts at the fix, so the same position is on route now
    let report = h.controller.handle_fix(off_route_fix(20_000)).await.unwrap();
    assert!(report.reroute.is_none());
    assert!(report.matched.distance_to_route_m < 2.0);
}

#[tokio::test]
async fn test_reroute_response_after_stop_is_ignored() {
    let response = response_for(&[off_route_position(), START]);
    let mut h = harness(ScriptedRoutingClient::gated(vec![Ok(response)])).await;

    h.controller.handle_fix(off_route_fix(10_000)).await.unwrap();
    assert!(h.controller.stop().await);

    h.client.release();
    h.controller.wait_for_reroutes().await;

    assert_eq!(h.client.calls(), 1);
    assert_eq!(h.controller.state().await, SessionState::Stopped);
    assert!(h.controller.active_route().await.is_none());
    assert!(!h.voice.spoken().iter().any(|s| s == "Route recalculated"));
    let events = drain_events(&mut h.events);
    assert_eq!(count(&events, |e| matches!(e, NavEvent::RerouteApplied { .. })), 0);
}

#[tokio::test]
async fn test_reroute_failure_after_stop_is_silent() {
    let h = harness(ScriptedRoutingClient::gated(vec![network_error()])).await;

    h.controller.handle_fix(off_route_fix(10_000)).await.unwrap();
    h.controller.stop().await;
    h.client.release();
    h.controller.wait_for_reroutes().await;

    assert!(h.notifier.notifications().is_empty());
}

#[tokio::test]
async fn test_reroute_from_previous_session_does_not_replace_new_route() {
    let response = response_for(&[off_route_position(), START]);
    let h = harness(ScriptedRoutingClient::gated(vec![Ok(response)])).await;

    h.controller.handle_fix(off_route_fix(10_000)).await.unwrap();
    h.controller.stop().await;

    let next = straight_route(LatLng::new(48.0, 9.0), 1_000.0);
    let next_id = next.id;
    h.controller.start(next).await.unwrap();

    h.client.release();
    h.controller.wait_for_reroutes().await;

    assert_eq!(h.controller.active_route().await.unwrap().id, next_id);
}

#[tokio::test]
async fn test_overlapping_reroutes_apply_once() {
    let destination = destination_point(&START, 0.0, 2_000.0);
    let far_away = LatLng::new(10.0, 10.0);
    let mut h = harness(ScriptedRoutingClient::gated(vec![
        Ok(response_for(&[far_away, destination])),
        Ok(response_for(&[far_away, destination])),
    ]))
    .await;

    // Debounce elapsed while the first request is still in flight
    h.controller.handle_fix(off_route_fix(10_000)).await.unwrap();
    h.controller.handle_fix(off_route_fix(16_000)).await.unwrap();
    h.client.release();
    h.client.release();
    h.controller.wait_for_reroutes().await;

    assert_eq!(h.client.calls(), 2);
    let events = drain_events(&mut h.events);
    assert_eq!(count(&events, |e| matches!(e, NavEvent::RerouteApplied { .. })), 1);
}
