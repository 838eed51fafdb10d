//! Synthetic routes and fix sequences

use wnav_common::geo::destination_point;
use wnav_common::LatLng;
use wnav_tracker::tracking::{ActiveRoute, Destination, PositionFix, RoutePolyline, RouteResponse, TravelMode};

/// Corner of the left-turn route
pub const CORNER: LatLng = LatLng::new(47.0, 8.0);

/// Three points: 1 km northbound into [`CORNER`], then 1 km west (90° left)
pub fn left_turn_route() -> ActiveRoute {
    let start = destination_point(&CORNER, 180.0, 1_000.0);
    let end = destination_point(&CORNER, 270.0, 1_000.0);
    let polyline = RoutePolyline::new(vec![start, CORNER, end]).unwrap();
    ActiveRoute::from_polyline(polyline, Destination::named("West end", end), TravelMode::Driving)
}

/// Northbound straight route from `start` with a vertex every 100 m
pub fn straight_route(start: LatLng, length_m: f64) -> ActiveRoute {
    let steps = (length_m / 100.0).round() as usize;
    let points: Vec<LatLng> = (0..=steps)
        .map(|i| destination_point(&start, 0.0, i as f64 * 100.0))
        .collect();
    let end = *points.last().unwrap();
    ActiveRoute::from_polyline(RoutePolyline::new(points).unwrap(), Destination::new(end), TravelMode::Driving)
}

/// Successful routing response with `points` as encoded geometry
pub fn response_for(points: &[LatLng]) -> RouteResponse {
    RouteResponse {
        success: true,
        geometry: Some(wnav_common::polyline::encode(points).unwrap()),
        distance_km: Some(wnav_common::geo::path_length_m(points) / 1000.0),
        duration_minutes: Some(5.0),
        costs: None,
        error: None,
    }
}

/// One fix per second along `bearing` from `origin`
///
/// The first fix is `start_offset_m` from `origin`; each next one moves
/// `step_m` further (negative steps move back towards `origin`).
pub fn fixes_along(
    origin: &LatLng,
    bearing: f64,
    start_offset_m: f64,
    step_m: f64,
    count: usize,
    start_ms: i64,
) -> Vec<PositionFix> {
    (0..count)
        .map(|i| {
            let p = destination_point(origin, bearing, start_offset_m + i as f64 * step_m);
            PositionFix::new(p.lat, p.lng, start_ms + i as i64 * 1_000).with_speed(step_m.abs())
        })
        .collect()
}
