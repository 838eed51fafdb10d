//! Route model
//!
//! An [`ActiveRoute`] is created when a route calculation succeeds and is
//! replaced wholesale on reroute. Nothing mutates a route after construction;
//! sessions hold it behind an `Arc` so handlers can take a cheap snapshot.

use crate::error::{Error, Result};
use crate::tracking::routing::RouteResponse;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;
use wnav_common::geo::haversine_m;
use wnav_common::LatLng;

/// Ordered route geometry
///
/// Cumulative distances are computed once at construction so the remaining
/// distance from any vertex is a subtraction instead of a segment walk.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutePolyline {
    points: Vec<LatLng>,
    /// `cumulative_m[i]` = along-route distance from vertex 0 to vertex i
    cumulative_m: Vec<f64>,
}

impl RoutePolyline {
    /// Build a polyline from vertices
    ///
    /// # Errors
    ///
    /// [`Error::InvalidRoute`] if `points` is empty or contains a non-finite
    /// or out-of-range coordinate.
    pub fn new(points: Vec<LatLng>) -> Result<Self> {
        if points.is_empty() {
            return Err(Error::InvalidRoute("route polyline is empty".to_string()));
        }
        if let Some((i, p)) = points.iter().enumerate().find(|(_, p)| !p.is_valid()) {
            return Err(Error::InvalidRoute(format!(
                "vertex {} has invalid coordinate ({}, {})",
                i, p.lat, p.lng
            )));
        }

        let mut cumulative_m = Vec::with_capacity(points.len());
        let mut total = 0.0;
        cumulative_m.push(0.0);
        for w in points.windows(2) {
            total += haversine_m(&w[0], &w[1]);
            cumulative_m.push(total);
        }

        Ok(Self { points, cumulative_m })
    }

    /// Decode an encoded polyline (precision 1e-5)
    pub fn from_encoded(encoded: &str) -> Result<Self> {
        let points = wnav_common::polyline::decode(encoded)?;
        Self::new(points)
    }

    /// Vertices in route order
    pub fn points(&self) -> &[LatLng] {
        &self.points
    }

    /// Number of vertices (never zero)
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Always false: an empty polyline cannot be constructed
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Vertex at `index`
    pub fn get(&self, index: usize) -> Option<&LatLng> {
        self.points.get(index)
    }

    /// Last vertex of the route
    pub fn last(&self) -> &LatLng {
        // Non-empty by construction
        &self.points[self.points.len() - 1]
    }

    /// Total along-route length in meters
    pub fn length_m(&self) -> f64 {
        self.cumulative_m.last().copied().unwrap_or(0.0)
    }

    /// Along-route distance from vertex `index` to the final vertex
    ///
    /// Indices past the end are treated as the final vertex.
    pub fn remaining_from(&self, index: usize) -> f64 {
        let index = index.min(self.points.len() - 1);
        self.length_m() - self.cumulative_m[index]
    }
}

/// Travel mode requested from the routing backend
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TravelMode {
    #[default]
    Driving,
    Walking,
    Cycling,
}

impl std::str::FromStr for TravelMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "driving" | "car" => Ok(TravelMode::Driving),
            "walking" | "foot" => Ok(TravelMode::Walking),
            "cycling" | "bike" => Ok(TravelMode::Cycling),
            other => Err(Error::Config(format!("unknown travel mode '{}'", other))),
        }
    }
}

impl std::fmt::Display for TravelMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TravelMode::Driving => write!(f, "driving"),
            TravelMode::Walking => write!(f, "walking"),
            TravelMode::Cycling => write!(f, "cycling"),
        }
    }
}

/// Where the trip is going
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Destination {
    /// Display name (address or place), if known
    #[serde(default)]
    pub name: Option<String>,
    pub position: LatLng,
}

impl Destination {
    pub fn new(position: LatLng) -> Self {
        Self { name: None, position }
    }

    pub fn named(name: impl Into<String>, position: LatLng) -> Self {
        Self {
            name: Some(name.into()),
            position,
        }
    }
}

/// Trip cost estimate as reported by the routing backend
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CostBreakdown {
    pub fuel: Option<f64>,
    pub tolls: Option<f64>,
    pub total: Option<f64>,
    pub currency: Option<String>,
}

/// The route currently being followed
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveRoute {
    pub id: Uuid,
    pub polyline: RoutePolyline,
    /// Backend-reported route length in meters
    pub distance_m: f64,
    /// Backend-reported travel time in seconds
    pub duration_s: f64,
    pub costs: CostBreakdown,
    pub destination: Destination,
    pub mode: TravelMode,
}

impl ActiveRoute {
    /// Build a route from a polyline, deriving distance from the geometry
    ///
    /// Duration is unknown (zero) for routes that did not come from a backend.
    pub fn from_polyline(polyline: RoutePolyline, destination: Destination, mode: TravelMode) -> Self {
        Self {
            id: Uuid::new_v4(),
            distance_m: polyline.length_m(),
            duration_s: 0.0,
            costs: CostBreakdown::default(),
            polyline,
            destination,
            mode,
        }
    }

    /// Build a route from a successful routing response
    ///
    /// # Errors
    ///
    /// - [`Error::Routing`] if the response reports failure
    /// - [`Error::InvalidRoute`] if the geometry is missing, empty or undecodable
    pub fn from_response(response: RouteResponse, destination: Destination, mode: TravelMode) -> Result<Self> {
        if !response.success {
            return Err(Error::Routing(
                response
                    .error
                    .unwrap_or_else(|| "routing backend reported failure".to_string()),
            ));
        }

        let geometry = response
            .geometry
            .ok_or_else(|| Error::InvalidRoute("response has no geometry".to_string()))?;

        let polyline = RoutePolyline::from_encoded(&geometry).map_err(|e| match e {
            Error::Common(inner) => Error::InvalidRoute(inner.to_string()),
            other => other,
        })?;

        let distance_m = response
            .distance_km
            .filter(|d| d.is_finite() && *d >= 0.0)
            .map(|km| km * 1000.0)
            .unwrap_or_else(|| polyline.length_m());
        let duration_s = response
            .duration_minutes
            .filter(|d| d.is_finite() && *d >= 0.0)
            .map(|min| min * 60.0)
            .unwrap_or(0.0);

        Ok(Self {
            id: Uuid::new_v4(),
            polyline,
            distance_m,
            duration_s,
            costs: response.costs.unwrap_or_default(),
            destination,
            mode,
        })
    }

    /// Wrap in an `Arc` for sharing between session snapshots
    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }
}
