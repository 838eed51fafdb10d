//! Geodesy helpers
//!
//! Great-circle math on WGS84 coordinates (degrees). Distances use the
//! haversine formula on a spherical Earth of radius 6,371,000 m, which is
//! what every distance in the tracking engine is measured with.

use serde::{Deserialize, Serialize};

/// Mean Earth radius in meters
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// A latitude/longitude pair in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    /// Latitude in degrees (-90..=90)
    pub lat: f64,
    /// Longitude in degrees (-180..=180)
    pub lng: f64,
}

impl LatLng {
    /// Create a new coordinate
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// True when both components are finite and inside the WGS84 range
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }

    /// Great-circle distance to `other` in meters
    pub fn distance_to(&self, other: &LatLng) -> f64 {
        haversine_m(self, other)
    }

    /// Initial bearing towards `other` in degrees [0, 360)
    pub fn bearing_to(&self, other: &LatLng) -> f64 {
        bearing_deg(self, other)
    }
}

impl From<(f64, f64)> for LatLng {
    fn from((lat, lng): (f64, f64)) -> Self {
        Self { lat, lng }
    }
}

/// Haversine distance between two points in meters
pub fn haversine_m(a: &LatLng, b: &LatLng) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dlat = (b.lat - a.lat).to_radians();
    let dlng = (b.lng - a.lng).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);

    // Rounding can push h marginally above 1.0 for antipodal points
    2.0 * EARTH_RADIUS_M * h.sqrt().min(1.0).asin()
}

/// Initial bearing from `a` to `b` in degrees [0, 360)
pub fn bearing_deg(a: &LatLng, b: &LatLng) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dlng = (b.lng - a.lng).to_radians();

    let y = dlng.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * dlng.cos();

    (y.atan2(x).to_degrees() + 360.0) % 360.0
}

/// Normalize an angle difference into [-180, 180]
///
/// Negative values are counter-clockwise (left), positive clockwise (right).
pub fn normalize_delta_deg(delta: f64) -> f64 {
    let mut d = delta % 360.0;
    if d > 180.0 {
        d -= 360.0;
    } else if d < -180.0 {
        d += 360.0;
    }
    d
}

/// Signed heading change from `from_bearing` to `to_bearing` in [-180, 180]
pub fn bearing_delta_deg(from_bearing: f64, to_bearing: f64) -> f64 {
    normalize_delta_deg(to_bearing - from_bearing)
}

/// Point reached by travelling `distance_m` from `origin` on `bearing` degrees
///
/// Used by the replay tooling and tests to lay out synthetic routes.
pub fn destination_point(origin: &LatLng, bearing: f64, distance_m: f64) -> LatLng {
    let delta = distance_m / EARTH_RADIUS_M;
    let theta = bearing.to_radians();
    let lat1 = origin.lat.to_radians();
    let lng1 = origin.lng.to_radians();

    let lat2 = (lat1.sin() * delta.cos() + lat1.cos() * delta.sin() * theta.cos()).asin();
    let lng2 = lng1
        + (theta.sin() * delta.sin() * lat1.cos()).atan2(delta.cos() - lat1.sin() * lat2.sin());

    LatLng {
        lat: lat2.to_degrees(),
        lng: ((lng2.to_degrees() + 540.0) % 360.0) - 180.0,
    }
}

/// Closest point to `p` on the segment `a`-`b`
///
/// Uses a planar approximation scaled by latitude cosine, accurate enough
/// for segments shorter than a few kilometers.
pub fn project_on_segment(p: &LatLng, a: &LatLng, b: &LatLng) -> LatLng {
    let cos_lat = ((a.lat + b.lat) / 2.0).to_radians().cos();

    let dx = (b.lng - a.lng) * cos_lat;
    let dy = b.lat - a.lat;
    let px = (p.lng - a.lng) * cos_lat;
    let py = p.lat - a.lat;

    let seg_len_sq = dx * dx + dy * dy;
    if seg_len_sq < 1e-20 {
        return *a;
    }

    let t = ((px * dx + py * dy) / seg_len_sq).clamp(0.0, 1.0);
    LatLng {
        lat: a.lat + t * (b.lat - a.lat),
        lng: a.lng + t * (b.lng - a.lng),
    }
}

/// Distance in meters from `p` to the closest point of segment `a`-`b`
pub fn distance_to_segment_m(p: &LatLng, a: &LatLng, b: &LatLng) -> f64 {
    haversine_m(p, &project_on_segment(p, a, b))
}

/// Total length of a path in meters
pub fn path_length_m(points: &[LatLng]) -> f64 {
    points.windows(2).map(|w| haversine_m(&w[0], &w[1])).sum()
}
