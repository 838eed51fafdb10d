//! Turn announcement scenarios driven through a full navigation session

mod helpers;

use helpers::{fixes_along, left_turn_route, CORNER};
use wnav_common::events::{Announcement, TurnDirection};
use wnav_common::geo::destination_point;
use wnav_common::LatLng;
use wnav_tracker::config::SessionSettings;
use wnav_tracker::tracking::{ActiveRoute, Destination, PositionFix, RoutePolyline, TravelMode};
use wnav_tracker::NavigationSession;

fn turn_announcements(session: &mut NavigationSession, fixes: &[PositionFix]) -> Vec<(f64, TurnDirection)> {
    let mut fired = Vec::new();
    for fix in fixes {
        let report = session.process_fix(fix).unwrap();
        for announcement in report.announcements {
            if let Announcement::Turn {
                direction,
                threshold_m,
                ..
            } = announcement
            {
                fired.push((threshold_m, direction));
            }
        }
    }
    fired
}

fn session_on(route: ActiveRoute) -> NavigationSession {
    let mut session = NavigationSession::new(SessionSettings::default());
    session.start(route).unwrap();
    assert!(session.mark_active());
    session
}

fn active_session() -> NavigationSession {
    session_on(left_turn_route())
}

#[test]
fn test_left_turn_fires_each_threshold_once() {
    let mut session = active_session();

    // 610 m south of the corner heading north at 13 m/s, through the corner
    let approach: Vec<PositionFix> = fixes_along(&CORNER, 180.0, 610.0, -13.0, 47, 0);
    let fired = turn_announcements(&mut session, &approach);

    let thresholds: Vec<f64> = fired.iter().map(|(t, _)| *t).collect();
    assert_eq!(thresholds, vec![500.0, 200.0, 100.0, 50.0]);
    assert!(fired.iter().all(|(_, d)| *d == TurnDirection::Left));
}

#[test]
fn test_no_refire_after_corner() {
    let mut session = active_session();

    let approach = fixes_along(&CORNER, 180.0, 610.0, -13.0, 47, 0);
    assert_eq!(turn_announcements(&mut session, &approach).len(), 4);

    // Continue west along the outgoing leg
    let departure = fixes_along(&CORNER, 270.0, 13.0, 13.0, 60, 47_000);
    assert!(turn_announcements(&mut session, &departure).is_empty());
}

#[test]
fn test_gps_jitter_does_not_duplicate() {
    let mut session = active_session();

    // Jitter back and forth around the 200 m boundary
    let mut fixes = fixes_along(&CORNER, 180.0, 260.0, -13.0, 6, 0);
    fixes.extend(fixes_along(&CORNER, 180.0, 195.0, 13.0, 3, 6_000));
    fixes.extend(fixes_along(&CORNER, 180.0, 210.0, -13.0, 12, 9_000));

    let thresholds: Vec<f64> = turn_announcements(&mut session, &fixes).into_iter().map(|(t, _)| t).collect();
    assert_eq!(thresholds.iter().filter(|t| **t == 200.0).count(), 1);
    assert_eq!(thresholds.iter().filter(|t| **t == 100.0).count(), 1);
}

#[test]
fn test_backing_off_past_reset_rearms() {
    let mut session = active_session();

    let first = fixes_along(&CORNER, 180.0, 520.0, -13.0, 4, 0);
    assert_eq!(turn_announcements(&mut session, &first), vec![(500.0, TurnDirection::Left)]);

    // Drive back south beyond 600 m, then approach again
    let back = fixes_along(&CORNER, 180.0, 500.0, 13.0, 10, 4_000);
    assert!(turn_announcements(&mut session, &back).is_empty());

    let again = fixes_along(&CORNER, 180.0, 620.0, -13.0, 12, 14_000);
    assert_eq!(turn_announcements(&mut session, &again), vec![(500.0, TurnDirection::Left)]);
}

#[test]
fn test_new_route_resets_turn_state() {
    let mut session = active_session();
    let approach = fixes_along(&CORNER, 180.0, 520.0, -13.0, 4, 0);
    assert_eq!(turn_announcements(&mut session, &approach).len(), 1);

    let generation = session.generation();
    assert!(session.apply_reroute(generation, left_turn_route()));

    let again = fixes_along(&CORNER, 180.0, 496.0, -13.0, 1, 4_000);
    assert_eq!(turn_announcements(&mut session, &again), vec![(500.0, TurnDirection::Left)]);
}

#[test]
fn test_jitter_around_corner_does_not_refire() {
    // 300 m north, right onto 200 m at 100°, then left back to north for 300 m
    let start = LatLng::new(47.0, 8.0);
    let first_corner = destination_point(&start, 0.0, 300.0);
    let second_corner = destination_point(&first_corner, 100.0, 200.0);
    let end = destination_point(&second_corner, 0.0, 300.0);
    let polyline = RoutePolyline::new(vec![start, first_corner, second_corner, end]).unwrap();
    let mut session = session_on(ActiveRoute::from_polyline(
        polyline,
        Destination::new(end),
        TravelMode::Driving,
    ));

    // Alternate 15 m before and 15 m after the first corner: the lookahead
    // flips between the two turns on every fix
    let before = destination_point(&first_corner, 180.0, 15.0);
    let after = destination_point(&first_corner, 100.0, 15.0);
    let fixes: Vec<PositionFix> = (0..5)
        .map(|i| {
            let p = if i % 2 == 0 { before } else { after };
            PositionFix::new(p.lat, p.lng, i * 1_000)
        })
        .collect();

    let fired = turn_announcements(&mut session, &fixes);
    assert_eq!(
        fired,
        vec![(50.0, TurnDirection::Right), (200.0, TurnDirection::Left)]
    );
}
