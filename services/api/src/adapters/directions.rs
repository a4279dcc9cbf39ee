//! services/api/src/adapters/directions.rs
//!
//! Route lookups against a Google-Directions-compatible HTTP API.
//! It implements the `DirectionsService` port from the `core` crate.

use async_trait::async_trait;
use carbon_lens_core::domain::TransportMode;
use carbon_lens_core::ports::{DirectionsOutcome, DirectionsService, PortError, PortResult, RouteInfo};
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::debug;

#[derive(Debug, Deserialize)]
pub struct DirectionsResponse {
    pub status: String,
    #[serde(default)]
    pub routes: Vec<Route>,
}

#[derive(Debug, Deserialize)]
pub struct Route {
    #[serde(default)]
    pub legs: Vec<Leg>,
}

#[derive(Debug, Deserialize)]
pub struct Leg {
    pub distance: Measure,
    pub duration: Measure,
    #[serde(default)]
    pub start_address: String,
    #[serde(default)]
    pub end_address: String,
}

/// Metres for distances, seconds for durations.
#[derive(Debug, Deserialize)]
pub struct Measure {
    pub value: i64,
}

/// The provider's travel mode, or `None` when it cannot route this mode.
pub fn provider_mode(mode: TransportMode) -> Option<&'static str> {
    match mode {
        TransportMode::Car | TransportMode::Motorbike => Some("driving"),
        TransportMode::Bus | TransportMode::Train => Some("transit"),
        TransportMode::Bike => Some("bicycling"),
        TransportMode::Walk => Some("walking"),
        TransportMode::Plane => None,
    }
}

/// Folds the first route's legs into a single `RouteInfo`.
pub fn route_from_response(response: DirectionsResponse) -> DirectionsOutcome {
    if response.status != "OK" {
        debug!(status = %response.status, "Directions provider returned no route.");
        return DirectionsOutcome::Unavailable;
    }
    let Some(route) = response.routes.into_iter().next().filter(|r| !r.legs.is_empty()) else {
        return DirectionsOutcome::Unavailable;
    };

    let metres: i64 = route.legs.iter().map(|l| l.distance.value.max(0)).sum();
    let seconds: i64 = route.legs.iter().map(|l| l.duration.value.max(0)).sum();
    let origin_address = route.legs.first().map(|l| l.start_address.clone()).unwrap_or_default();
    let destination_address = route.legs.last().map(|l| l.end_address.clone()).unwrap_or_default();

    DirectionsOutcome::Route(RouteInfo {
        distance_km: Decimal::new(metres, 3).round_dp(2),
        duration_min: u32::try_from((seconds + 30) / 60).unwrap_or(u32::MAX),
        origin_address,
        destination_address,
    })
}

/// An adapter that implements `DirectionsService` over HTTP.
#[derive(Clone)]
pub struct HttpDirectionsAdapter {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpDirectionsAdapter {
    pub fn new(client: Client, base_url: String, api_key: Option<String>) -> Self {
        Self { client, base_url, api_key }
    }
}

#[async_trait]
impl DirectionsService for HttpDirectionsAdapter {
    async fn directions(
        &self,
        origin: &str,
        destination: &str,
        mode: TransportMode,
    ) -> PortResult<DirectionsOutcome> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Ok(DirectionsOutcome::Unavailable);
        };
        let Some(provider_mode) = provider_mode(mode) else {
            return Ok(DirectionsOutcome::Unavailable);
        };

        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("origin", origin),
                ("destination", destination),
                ("mode", provider_mode),
                ("key", api_key),
            ])
            .send()
            .await
            .map_err(|e| PortError::Unavailable(e.to_string()))?
            .error_for_status()
            .map_err(|e| PortError::Unavailable(e.to_string()))?;

        let body: DirectionsResponse = response
            .json()
            .await
            .map_err(|e| PortError::Unexpected(format!("Malformed directions response: {}", e)))?;

        Ok(route_from_response(body))
    }
}
