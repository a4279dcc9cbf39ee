//! Transport carbon and duration formulas.
//!
//! These are pure, total functions over static tables. They back the trip
//! planner whenever the mapping provider cannot supply a route.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::domain::{round2, ModeEstimate, TransportMode};

/// kg CO2e per passenger-km, scale 3.
const EMISSION_FACTORS: &[(TransportMode, i64)] = &[
    (TransportMode::Car, 171),
    (TransportMode::Motorbike, 114),
    (TransportMode::Bus, 89),
    (TransportMode::Train, 41),
    (TransportMode::Bike, 0),
    (TransportMode::Walk, 0),
    (TransportMode::Plane, 255),
];

/// Average speed in km/h.
const AVERAGE_SPEEDS: &[(TransportMode, i64)] = &[
    (TransportMode::Car, 50),
    (TransportMode::Motorbike, 45),
    (TransportMode::Bus, 25),
    (TransportMode::Train, 60),
    (TransportMode::Bike, 15),
    (TransportMode::Walk, 5),
    (TransportMode::Plane, 700),
];

/// Modes offered when comparing alternatives, in tie-break order.
pub const ALTERNATIVE_MODES: [TransportMode; 5] = [
    TransportMode::Car,
    TransportMode::Bus,
    TransportMode::Train,
    TransportMode::Bike,
    TransportMode::Walk,
];

fn lookup(table: &[(TransportMode, i64)], mode: TransportMode) -> i64 {
    table
        .iter()
        .find(|(m, _)| *m == mode)
        .or_else(|| table.iter().find(|(m, _)| *m == TransportMode::Car))
        .map(|(_, value)| *value)
        .unwrap_or_default()
}

pub fn emission_factor(mode: TransportMode) -> Decimal {
    Decimal::new(lookup(EMISSION_FACTORS, mode), 3)
}

pub fn average_speed_kmh(mode: TransportMode) -> Decimal {
    Decimal::from(lookup(AVERAGE_SPEEDS, mode))
}

/// Estimated kg CO2e for travelling `distance_km` by `mode`, rounded to 2 dp.
pub fn estimate_trip_carbon(distance_km: Decimal, mode: TransportMode) -> Decimal {
    let carbon = distance_km
        .max(Decimal::ZERO)
        .checked_mul(emission_factor(mode))
        .unwrap_or(Decimal::MAX);
    round2(carbon)
}

/// Estimated travel time in whole minutes.
pub fn estimate_duration(distance_km: Decimal, mode: TransportMode) -> u32 {
    let speed = average_speed_kmh(mode);
    if speed.is_zero() {
        return 0;
    }
    distance_km
        .max(Decimal::ZERO)
        .checked_div(speed)
        .and_then(|hours| hours.checked_mul(Decimal::from(60)))
        .and_then(|minutes| minutes.round().to_u32())
        .unwrap_or(u32::MAX)
}

/// Every alternative mode except `excluded`, cheapest first.
pub fn compare_alternatives(distance_km: Decimal, excluded: TransportMode) -> Vec<ModeEstimate> {
    let mut estimates: Vec<ModeEstimate> = ALTERNATIVE_MODES
        .iter()
        .copied()
        .filter(|mode| *mode != excluded)
        .map(|mode| ModeEstimate {
            mode,
            carbon_kg: estimate_trip_carbon(distance_km, mode),
            duration_min: estimate_duration(distance_km, mode),
        })
        .collect();
    // `sort_by` is stable, so equal carbon keeps table order.
    estimates.sort_by(|a, b| a.carbon_kg.cmp(&b.carbon_kg));
    estimates
}

/// Carbon avoided by choosing `chosen` over `baseline`, never negative.
pub fn carbon_saved(distance_km: Decimal, chosen: TransportMode, baseline: TransportMode) -> Decimal {
    (estimate_trip_carbon(distance_km, baseline) - estimate_trip_carbon(distance_km, chosen))
        .max(Decimal::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn km(value: i64) -> Decimal {
        Decimal::from(value)
    }

    #[test]
    fn bus_and_walk_factors() {
        assert_eq!(estimate_trip_carbon(km(10), TransportMode::Bus), Decimal::new(89, 2));
        assert_eq!(estimate_trip_carbon(km(10), TransportMode::Walk), Decimal::ZERO);
        assert_eq!(estimate_trip_carbon(km(10), TransportMode::Car), Decimal::new(171, 2));
    }

    #[test]
    fn unknown_mode_uses_car_factor() {
        let mode = TransportMode::parse_lossy("teleporter");
        assert_eq!(
            estimate_trip_carbon(km(10), mode),
            estimate_trip_carbon(km(10), TransportMode::Car)
        );
        assert_eq!(estimate_duration(km(10), mode), 12);
    }

    #[test]
    fn negative_distance_is_zero() {
        assert_eq!(estimate_trip_carbon(km(-5), TransportMode::Car), Decimal::ZERO);
        assert_eq!(estimate_duration(km(-5), TransportMode::Car), 0);
    }

    #[test]
    fn huge_distances_saturate() {
        let far = Decimal::from_i128_with_scale(10i128.pow(28), 0);
        assert_eq!(estimate_duration(far, TransportMode::Walk), u32::MAX);
        assert_eq!(estimate_duration(Decimal::MAX, TransportMode::Car), u32::MAX);
        assert_eq!(estimate_trip_carbon(far, TransportMode::Walk), Decimal::ZERO);
        assert!(estimate_trip_carbon(Decimal::MAX, TransportMode::Plane) > Decimal::ZERO);

        let alternatives = compare_alternatives(far, TransportMode::Car);
        assert_eq!(alternatives.len(), 4);
        assert!(alternatives.iter().all(|a| a.duration_min == u32::MAX));
        assert_eq!(alternatives[0].mode, TransportMode::Bike);
    }

    #[test]
    fn durations_in_minutes() {
        assert_eq!(estimate_duration(km(10), TransportMode::Walk), 120);
        assert_eq!(estimate_duration(km(10), TransportMode::Bus), 24);
        assert_eq!(estimate_duration(km(15), TransportMode::Bike), 60);
    }

    #[test]
    fn every_mode_has_table_entries() {
        for mode in [
            TransportMode::Car,
            TransportMode::Motorbike,
            TransportMode::Bus,
            TransportMode::Train,
            TransportMode::Bike,
            TransportMode::Walk,
            TransportMode::Plane,
        ] {
            assert!(EMISSION_FACTORS.iter().any(|(m, _)| *m == mode));
            assert!(AVERAGE_SPEEDS.iter().any(|(m, _)| *m == mode));
        }
    }

    #[test]
    fn alternatives_sorted_and_stable() {
        let alternatives = compare_alternatives(km(10), TransportMode::Car);
        let modes: Vec<_> = alternatives.iter().map(|a| a.mode).collect();
        // bike and walk tie at zero and keep table order.
        assert_eq!(
            modes,
            vec![TransportMode::Bike, TransportMode::Walk, TransportMode::Train, TransportMode::Bus]
        );
        assert_eq!(alternatives[3].carbon_kg, Decimal::new(89, 2));
    }

    #[test]
    fn excluding_a_mode_outside_the_set_keeps_all() {
        assert_eq!(compare_alternatives(km(3), TransportMode::Plane).len(), 5);
    }

    #[test]
    fn savings_never_negative() {
        assert_eq!(
            carbon_saved(km(10), TransportMode::Bus, TransportMode::Car),
            Decimal::new(82, 2)
        );
        assert_eq!(carbon_saved(km(10), TransportMode::Plane, TransportMode::Car), Decimal::ZERO);
    }
}
