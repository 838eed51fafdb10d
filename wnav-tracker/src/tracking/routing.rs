//! Routing backend client
//!
//! Only the request/response contract of the backend is consumed here; how it
//! computes routes is its own business. Geometry comes back as an encoded
//! polyline (precision 1e-5) and is decoded by [`ActiveRoute::from_response`].
//!
//! [`ActiveRoute::from_response`]: crate::tracking::route::ActiveRoute::from_response

use crate::error::{Error, Result};
use crate::tracking::route::{CostBreakdown, TravelMode};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use wnav_common::LatLng;

const USER_AGENT: &str = "wnav-tracker/0.1.0";
const ROUTE_PATH: &str = "/api/route";

/// Route calculation request body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteRequest {
    pub origin: LatLng,
    pub destination: LatLng,
    pub mode: TravelMode,
}

/// Route calculation response body
///
/// Every field is optional on the wire; a failed calculation usually only
/// carries `success = false` and `error`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouteResponse {
    pub success: bool,
    /// Encoded polyline
    pub geometry: Option<String>,
    pub distance_km: Option<f64>,
    pub duration_minutes: Option<f64>,
    pub costs: Option<CostBreakdown>,
    pub error: Option<String>,
}

/// Anything that can calculate a route
#[async_trait]
pub trait RoutingClient: Send + Sync {
    /// Calculate a route
    ///
    /// Transport failures are [`Error::Network`]. A response with
    /// `success = false` is returned as-is; interpreting it is up to the caller.
    async fn calculate_route(&self, request: RouteRequest) -> Result<RouteResponse>;
}

/// JSON-over-HTTP routing client
pub struct HttpRoutingClient {
    http_client: reqwest::Client,
    endpoint: String,
}

impl HttpRoutingClient {
    pub fn new(base_url: &str, timeout_ms: u64) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_millis(timeout_ms))
            .build()
            .map_err(|e| Error::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            endpoint: format!("{}{}", base_url.trim_end_matches('/'), ROUTE_PATH),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl RoutingClient for HttpRoutingClient {
    async fn calculate_route(&self, request: RouteRequest) -> Result<RouteResponse> {
        tracing::debug!(
            endpoint = %self.endpoint,
            origin_lat = request.origin.lat,
            origin_lng = request.origin.lng,
            mode = %request.mode,
            "Requesting route"
        );

        let response = self.http_client.post(&self.endpoint).json(&request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(Error::Network(format!(
                "routing backend returned {}: {}",
                status.as_u16(),
                error_text
            )));
        }

        let route_response: RouteResponse = response
            .json()
            .await
            .map_err(|e| Error::Network(format!("unreadable routing response: {}", e)))?;

        tracing::debug!(
            success = route_response.success,
            distance_km = route_response.distance_km,
            "Routing backend answered"
        );

        Ok(route_response)
    }
}
