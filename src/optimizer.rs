// Optimization entry point: trip validation, stay pricing and package composition
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::composer::{PackageComposer, PairCandidate, DEFAULT_MAX_ACTIVITIES};
use crate::error::{OptimizerError, Result};
use crate::offer::{BestPackage, OfferKind, PricedOffer, TripRequest};
use crate::stay::{price_stays, stay_duration, StayPricedHotel};

// Optimizer configuration, passed in per call rather than held globally
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    pub max_activities: usize,
    pub max_alternatives: usize,
    /// Estimated food spend per adult per night, in minor units. Reported only.
    pub daily_meal_allowance_minor: u64,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            max_activities: DEFAULT_MAX_ACTIVITIES,
            max_alternatives: 5,
            daily_meal_allowance_minor: 0,
        }
    }
}

/// A flight+hotel combination reported alongside the chosen package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageAlternative {
    pub flight_id: String,
    pub hotel_id: String,
    pub flight_total: u64,
    pub hotel_total: u64,
    pub total: u64,
}

impl PackageAlternative {
    fn from_pair(pair: &PairCandidate, flights: &[PricedOffer], hotels: &[StayPricedHotel]) -> Self {
        Self {
            flight_id: flights[pair.flight_index].id.clone(),
            hotel_id: hotels[pair.hotel_index].offer.id.clone(),
            flight_total: pair.flight_total,
            hotel_total: pair.hotel_total,
            total: pair.total,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptimizationDiagnostics {
    pub flights_considered: usize,
    pub hotels_considered: usize,
    pub activities_considered: usize,
    pub pairs_evaluated: usize,
    pub cheapest: PackageAlternative,
    pub most_expensive: PackageAlternative,
    /// Cheapest flight+hotel pairs in rank order, the chosen pair first.
    pub alternatives: Vec<PackageAlternative>,
    pub estimated_meals_total: u64,
    pub estimated_trip_total: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationResult {
    pub package: BestPackage,
    pub diagnostics: OptimizationDiagnostics,
}

#[derive(Debug, Clone)]
pub struct PackageOptimizer {
    config: OptimizerConfig,
    composer: PackageComposer,
}

impl Default for PackageOptimizer {
    fn default() -> Self {
        Self::new(OptimizerConfig::default())
    }
}

impl PackageOptimizer {
    pub fn new(config: OptimizerConfig) -> Self {
        let composer = PackageComposer::new(config.max_activities);
        Self { config, composer }
    }

    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    /// Validates the trip, prices hotel stays and picks the cheapest package.
    /// Errors propagate unchanged; nothing is retried and no partial package is returned.
    pub fn optimize(
        &self,
        trip: &TripRequest,
        flights: &[PricedOffer],
        hotels: &[PricedOffer],
        activities: &[PricedOffer],
    ) -> Result<OptimizationResult> {
        self.run(trip, flights, hotels, activities).map_err(|err| {
            if err.is_defect() {
                warn!(error = %err, origin = %trip.origin, destination = %trip.destination, "offer feed defect");
            }
            err
        })
    }

    fn run(
        &self,
        trip: &TripRequest,
        flights: &[PricedOffer],
        hotels: &[PricedOffer],
        activities: &[PricedOffer],
    ) -> Result<OptimizationResult> {
        let nights = stay_duration(trip.departure_date, trip.return_date)?;
        if trip.adults == 0 {
            return Err(OptimizerError::InvalidTravelerCountError(trip.adults));
        }

        info!(
            origin = %trip.origin,
            destination = %trip.destination,
            nights,
            adults = trip.adults,
            flights = flights.len(),
            hotels = hotels.len(),
            activities = activities.len(),
            "computing best package"
        );

        if flights.is_empty() {
            return Err(OptimizerError::NoAvailableOfferError(OfferKind::Flight));
        }
        if hotels.is_empty() {
            return Err(OptimizerError::NoAvailableOfferError(OfferKind::Hotel));
        }

        check_offer_set(OfferKind::Flight, flights)?;
        check_offer_set(OfferKind::Hotel, hotels)?;
        check_offer_set(OfferKind::Activity, activities)?;
        check_single_currency(flights.iter().chain(hotels).chain(activities))?;

        let stays = price_stays(hotels.to_vec(), nights)?;
        let evaluation = self.composer.evaluate_pairs(
            flights,
            &stays,
            trip.adults,
            self.config.max_alternatives,
        )?;
        let package = self.composer.assemble(
            &evaluation.best,
            flights,
            &stays,
            activities,
            trip.adults,
            nights,
        )?;

        let estimated_meals_total = self
            .config
            .daily_meal_allowance_minor
            .checked_mul(u64::from(trip.adults))
            .and_then(|per_night| per_night.checked_mul(u64::from(nights)))
            .ok_or_else(|| {
                OptimizerError::ConfigurationError("meal allowance overflows".to_string())
            })?;
        let estimated_trip_total = package
            .cost()
            .grand_total()
            .checked_add(estimated_meals_total)
            .ok_or_else(|| {
                OptimizerError::ConfigurationError("estimated trip total overflows".to_string())
            })?;

        let diagnostics = OptimizationDiagnostics {
            flights_considered: flights.len(),
            hotels_considered: stays.len(),
            activities_considered: activities.len(),
            pairs_evaluated: evaluation.pairs_evaluated,
            cheapest: PackageAlternative::from_pair(&evaluation.best, flights, &stays),
            most_expensive: PackageAlternative::from_pair(&evaluation.most_expensive, flights, &stays),
            alternatives: evaluation
                .ranked
                .iter()
                .map(|pair| PackageAlternative::from_pair(pair, flights, &stays))
                .collect(),
            estimated_meals_total,
            estimated_trip_total,
        };

        info!(
            flight = %package.flight().id,
            hotel = %package.hotel().id,
            activities = package.activities().len(),
            grand_total = package.cost().grand_total(),
            currency = %package.currency(),
            pairs_evaluated = diagnostics.pairs_evaluated,
            "best package selected"
        );

        Ok(OptimizationResult {
            package,
            diagnostics,
        })
    }
}

// Offers must sit in the list matching their kind and carry a unit valid for it
fn check_offer_set(expected: OfferKind, offers: &[PricedOffer]) -> Result<()> {
    for offer in offers {
        if offer.kind != expected {
            return Err(OptimizerError::ConfigurationError(format!(
                "{} offer '{}' supplied in the {} list",
                offer.kind, offer.id, expected
            )));
        }
        if !offer.unit.is_valid_for(offer.kind) {
            return Err(OptimizerError::ConfigurationError(format!(
                "{} offer '{}' is priced {:?}",
                offer.kind, offer.id, offer.unit
            )));
        }
    }
    Ok(())
}

fn check_single_currency<'a>(offers: impl Iterator<Item = &'a PricedOffer>) -> Result<()> {
    let currencies: BTreeSet<&str> = offers.map(|offer| offer.currency.code()).collect();
    if currencies.len() > 1 {
        let listed: Vec<&str> = currencies.into_iter().collect();
        return Err(OptimizerError::ConfigurationError(format!(
            "offers mix currencies: {}",
            listed.join(", ")
        )));
    }
    Ok(())
}

/// Computes the best package with the default configuration.
pub fn compute_best_package(
    trip: &TripRequest,
    flights: &[PricedOffer],
    hotels: &[PricedOffer],
    activities: &[PricedOffer],
) -> Result<BestPackage> {
    PackageOptimizer::default()
        .optimize(trip, flights, hotels, activities)
        .map(|result| result.package)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::offer::{Currency, PriceUnit};
    use chrono::NaiveDate;

    fn trip(adults: u32) -> TripRequest {
        TripRequest::round_trip(
            "LIS",
            "JFK",
            NaiveDate::from_ymd_opt(2025, 2, 1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 2, 5).unwrap(),
            adults,
        )
    }

    fn offer(kind: OfferKind, id: &str, price: u64, currency: &str) -> PricedOffer {
        PricedOffer::new(
            kind,
            id,
            id,
            price,
            Currency::parse(currency).unwrap(),
            kind.default_unit(),
        )
        .unwrap()
    }

    #[test]
    fn test_default_config() {
        let config = OptimizerConfig::default();
        assert_eq!(config.max_activities, 3);
        assert_eq!(config.max_alternatives, 5);
        assert_eq!(config.daily_meal_allowance_minor, 0);

        let partial: OptimizerConfig = serde_json::from_str(r#"{"max_activities": 1}"#).unwrap();
        assert_eq!(partial.max_activities, 1);
        assert_eq!(partial.max_alternatives, 5);
    }

    #[test]
    fn test_per_night_hotels_are_stay_priced() {
        let flights = vec![offer(OfferKind::Flight, "F1", 200, "USD")];
        let hotels = vec![
            offer(OfferKind::Hotel, "nightly", 100, "USD"),
            PricedOffer::new(
                OfferKind::Hotel,
                "whole-stay",
                "Whole stay",
                390,
                Currency::parse("USD").unwrap(),
                PriceUnit::PerStay,
            )
            .unwrap(),
        ];

        let result = PackageOptimizer::default()
            .optimize(&trip(1), &flights, &hotels, &[])
            .unwrap();
        assert_eq!(result.package.hotel().id, "whole-stay");
        assert_eq!(result.package.cost().hotel_total(), 390);
        assert_eq!(result.package.nights(), 4);
        assert_eq!(result.diagnostics.alternatives[1].hotel_total, 400);
    }

    #[test]
    fn test_zero_adults_rejected() {
        let flights = vec![offer(OfferKind::Flight, "F1", 200, "USD")];
        let hotels = vec![offer(OfferKind::Hotel, "H1", 100, "USD")];
        assert_eq!(
            compute_best_package(&trip(0), &flights, &hotels, &[]),
            Err(OptimizerError::InvalidTravelerCountError(0))
        );
    }

    #[test]
    fn test_mixed_currencies_rejected() {
        let flights = vec![offer(OfferKind::Flight, "F1", 200, "USD")];
        let hotels = vec![offer(OfferKind::Hotel, "H1", 100, "EUR")];
        let err = compute_best_package(&trip(1), &flights, &hotels, &[]).unwrap_err();
        assert!(err.is_defect());
        assert_eq!(err.to_string(), "Configuration error: offers mix currencies: EUR, USD");
    }

    #[test]
    fn test_offer_in_wrong_list_rejected() {
        let flights = vec![offer(OfferKind::Flight, "F1", 200, "USD")];
        let hotels = vec![offer(OfferKind::Activity, "A1", 100, "USD")];
        let err = compute_best_package(&trip(1), &flights, &hotels, &[]).unwrap_err();
        assert!(matches!(err, OptimizerError::ConfigurationError(_)));
    }

    #[test]
    fn test_inconsistent_unit_rejected() {
        let mut flight = offer(OfferKind::Flight, "F1", 200, "USD");
        flight.unit = PriceUnit::PerNight;
        let hotels = vec![offer(OfferKind::Hotel, "H1", 100, "USD")];
        let err = compute_best_package(&trip(1), &[flight], &hotels, &[]).unwrap_err();
        assert!(err.is_defect());
    }

    #[test]
    fn test_diagnostics() {
        let config = OptimizerConfig {
            max_activities: 1,
            max_alternatives: 2,
            daily_meal_allowance_minor: 50,
        };
        let flights = vec![
            offer(OfferKind::Flight, "F1", 200, "USD"),
            offer(OfferKind::Flight, "F2", 150, "USD"),
        ];
        let hotels = vec![
            offer(OfferKind::Hotel, "H1", 100, "USD"),
            offer(OfferKind::Hotel, "H2", 75, "USD"),
        ];
        let activities = vec![
            offer(OfferKind::Activity, "A1", 30, "USD"),
            offer(OfferKind::Activity, "A2", 20, "USD"),
        ];

        let result = PackageOptimizer::new(config)
            .optimize(&trip(2), &flights, &hotels, &activities)
            .unwrap();
        let diagnostics = &result.diagnostics;

        // 2 adults, 4 nights: F2+H2 = 300 + 300
        assert_eq!(result.package.cost().grand_total(), 620);
        assert_eq!(result.package.activities()[0].id, "A2");
        assert_eq!(diagnostics.pairs_evaluated, 4);
        assert_eq!(diagnostics.cheapest.total, 600);
        assert_eq!(diagnostics.most_expensive.flight_id, "F1");
        assert_eq!(diagnostics.most_expensive.hotel_id, "H1");
        assert_eq!(diagnostics.most_expensive.total, 800);
        assert_eq!(diagnostics.alternatives.len(), 2);
        assert_eq!(diagnostics.alternatives[1].total, 700);
        assert_eq!(diagnostics.estimated_meals_total, 400);
        assert_eq!(diagnostics.estimated_trip_total, 1020);
        assert_eq!(diagnostics.activities_considered, 2);
    }
}
