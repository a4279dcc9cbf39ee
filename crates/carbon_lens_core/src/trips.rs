//! Trip planning on top of the mapping collaborator, with formula fallback.

use rust_decimal::Decimal;
use serde_json::json;
use tracing::{debug, warn};

use crate::domain::{AnalyzedObject, Category, EstimateSource, TransportMode, TripEstimate};
use crate::estimation::{compare_alternatives, estimate_duration, estimate_trip_carbon};
use crate::ports::{DirectionsOutcome, DirectionsService};

/// Distance assumed when no route can be fetched.
pub const FALLBACK_DISTANCE_KM: Decimal = Decimal::TEN;

/// Estimates a trip. Carbon always comes from the emission tables; distance
/// and duration come from the mapping service when it can answer.
pub async fn plan_trip(
    directions: &dyn DirectionsService,
    origin: &str,
    destination: &str,
    mode: TransportMode,
) -> TripEstimate {
    let route = match directions.directions(origin, destination, mode).await {
        Ok(DirectionsOutcome::Route(route)) => Some(route),
        Ok(DirectionsOutcome::Unavailable) => {
            debug!("Directions unavailable; using formula estimates.");
            None
        }
        Err(e) => {
            warn!("Directions lookup failed, using formula estimates: {}", e);
            None
        }
    };

    match route {
        Some(route) => TripEstimate {
            mode,
            carbon_kg: estimate_trip_carbon(route.distance_km, mode),
            alternatives: compare_alternatives(route.distance_km, mode),
            distance_km: route.distance_km,
            duration_min: route.duration_min,
            origin: route.origin_address,
            destination: route.destination_address,
            source: EstimateSource::Directions,
        },
        None => TripEstimate {
            mode,
            distance_km: FALLBACK_DISTANCE_KM,
            duration_min: estimate_duration(FALLBACK_DISTANCE_KM, mode),
            carbon_kg: estimate_trip_carbon(FALLBACK_DISTANCE_KM, mode),
            alternatives: compare_alternatives(FALLBACK_DISTANCE_KM, mode),
            origin: origin.to_string(),
            destination: destination.to_string(),
            source: EstimateSource::Fallback,
        },
    }
}

/// The history entry for a trip.
pub fn trip_object(trip: &TripEstimate) -> AnalyzedObject {
    let source = match trip.source {
        EstimateSource::Directions => "directions",
        EstimateSource::Fallback => "fallback",
    };
    AnalyzedObject::new(
        format!("{} trip to {}", trip.mode, trip.destination),
        Category::Transport,
        trip.carbon_kg,
    )
    .with_metadata("mode", json!(trip.mode.as_str()))
    .with_metadata("distance_km", json!(trip.distance_km.to_string()))
    .with_metadata("duration_min", json!(trip.duration_min))
    .with_metadata("source", json!(source))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::RouteInfo;
    use crate::testing::{kg, ScriptedDirections};

    #[tokio::test]
    async fn unavailable_uses_placeholder_distance() {
        let directions = ScriptedDirections(Some(DirectionsOutcome::Unavailable));
        let trip = plan_trip(&directions, "home", "office", TransportMode::Bus).await;
        assert_eq!(trip.source, EstimateSource::Fallback);
        assert_eq!(trip.distance_km, kg(10, 0));
        assert_eq!(trip.carbon_kg, kg(89, 2));
        assert_eq!(trip.duration_min, 24);
        assert_eq!(trip.origin, "home");
        assert_eq!(trip.alternatives.len(), 4);
    }

    #[tokio::test]
    async fn provider_error_also_falls_back() {
        let directions = ScriptedDirections(None);
        let trip = plan_trip(&directions, "a", "b", TransportMode::Walk).await;
        assert_eq!(trip.source, EstimateSource::Fallback);
        assert_eq!(trip.carbon_kg, Decimal::ZERO);
    }

    #[tokio::test]
    async fn route_distance_drives_the_estimate() {
        let directions = ScriptedDirections(Some(DirectionsOutcome::Route(RouteInfo {
            distance_km: kg(42, 0),
            duration_min: 38,
            origin_address: "1 Main St".into(),
            destination_address: "2 High St".into(),
        })));
        let trip = plan_trip(&directions, "a", "b", TransportMode::Car).await;
        assert_eq!(trip.source, EstimateSource::Directions);
        assert_eq!(trip.duration_min, 38);
        assert_eq!(trip.carbon_kg, kg(718, 2));
        assert_eq!(trip.destination, "2 High St");

        let object = trip_object(&trip);
        assert_eq!(object.category, Category::Transport);
        assert_eq!(object.carbon_kg, kg(718, 2));
        assert_eq!(object.metadata["mode"], json!("car"));
    }
}
