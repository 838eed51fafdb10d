//! Route recalculation from the current position
//!
//! The coordinator only turns a trigger into a new [`ActiveRoute`]. Whether
//! the result may still be applied (session active, no newer reroute) is the
//! session controller's decision, made after the await.

use crate::error::Result;
use crate::tracking::route::{ActiveRoute, Destination, TravelMode};
use crate::tracking::routing::{RouteRequest, RoutingClient};
use std::sync::Arc;
use tracing::{info, warn};
use wnav_common::LatLng;

/// Calculates replacement routes through a [`RoutingClient`]
#[derive(Clone)]
pub struct RerouteCoordinator {
    client: Arc<dyn RoutingClient>,
}

impl RerouteCoordinator {
    pub fn new(client: Arc<dyn RoutingClient>) -> Self {
        Self { client }
    }

    /// Calculate a route from `origin` to `destination`
    ///
    /// # Errors
    ///
    /// Network failures, backend-reported failures and unusable geometry are
    /// all returned as errors; the caller keeps its previous route.
    pub async fn reroute(&self, origin: LatLng, destination: &Destination, mode: TravelMode) -> Result<ActiveRoute> {
        let request = RouteRequest {
            origin,
            destination: destination.position,
            mode,
        };

        let result = self
            .client
            .calculate_route(request)
            .await
            .and_then(|response| ActiveRoute::from_response(response, destination.clone(), mode));

        match &result {
            Ok(route) => info!(
                route_id = %route.id,
                vertices = route.polyline.len(),
                distance_m = route.distance_m,
                "Reroute calculated"
            ),
            Err(e) => warn!(error = %e, "Reroute failed"),
        }

        result
    }
}
