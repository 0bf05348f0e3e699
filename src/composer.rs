// Package composition: cheapest flight+hotel pair plus greedily chosen activities
use chrono::NaiveDateTime;
use serde::Serialize;
use tracing::debug;

use crate::error::{OptimizerError, Result};
use crate::offer::{BestPackage, OfferKind, PackageCost, PricedOffer};
use crate::stay::StayPricedHotel;

pub const DEFAULT_MAX_ACTIVITIES: usize = 3;

/// One flight+hotel combination, identified by the offers' positions in the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PairCandidate {
    pub flight_index: usize,
    pub hotel_index: usize,
    pub flight_total: u64,
    pub hotel_total: u64,
    pub total: u64,
    #[serde(skip)]
    departs_at: Option<NaiveDateTime>,
}

impl PairCandidate {
    // Cheapest first, then earlier departure, then input order.
    // `departs_at` is only set when every flight in the search lists one.
    fn rank_key(&self) -> (u64, Option<NaiveDateTime>, usize, usize) {
        (
            self.total,
            self.departs_at,
            self.flight_index,
            self.hotel_index,
        )
    }
}

/// Result of scanning every flight+hotel combination once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairEvaluation {
    pub best: PairCandidate,
    pub most_expensive: PairCandidate,
    pub pairs_evaluated: usize,
    /// Cheapest pairs in rank order, `best` first, bounded by the requested count.
    pub ranked: Vec<PairCandidate>,
}

#[derive(Debug, Clone)]
pub struct PackageComposer {
    max_activities: usize,
}

impl Default for PackageComposer {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ACTIVITIES)
    }
}

impl PackageComposer {
    pub fn new(max_activities: usize) -> Self {
        Self { max_activities }
    }

    pub fn max_activities(&self) -> usize {
        self.max_activities
    }

    /// Flights are priced per adult; the hotel is one room regardless of party size.
    fn pair_candidate(
        (flight_index, flight): (usize, &PricedOffer),
        (hotel_index, hotel): (usize, &StayPricedHotel),
        adults: u32,
        by_departure: bool,
    ) -> Result<PairCandidate> {
        let flight_total = flight
            .unit_price
            .checked_mul(u64::from(adults))
            .ok_or_else(|| {
                OptimizerError::malformed(OfferKind::Flight, &flight.id, "fare is too large")
            })?;
        let total = flight_total.checked_add(hotel.stay_total).ok_or_else(|| {
            OptimizerError::malformed(OfferKind::Hotel, &hotel.offer.id, "stay price is too large")
        })?;

        Ok(PairCandidate {
            flight_index,
            hotel_index,
            flight_total,
            hotel_total: hotel.stay_total,
            total,
            departs_at: flight.departs_at.filter(|_| by_departure),
        })
    }

    /// Scans the full cross product of flights and hotels, keeping the
    /// `keep_ranked` cheapest pairs in rank order.
    ///
    /// Equal totals go to the earlier departure only when every flight lists
    /// its departure time; otherwise the first flight in input order wins.
    pub fn evaluate_pairs(
        &self,
        flights: &[PricedOffer],
        hotels: &[StayPricedHotel],
        adults: u32,
        keep_ranked: usize,
    ) -> Result<PairEvaluation> {
        if flights.is_empty() {
            return Err(OptimizerError::NoAvailableOfferError(OfferKind::Flight));
        }
        if hotels.is_empty() {
            return Err(OptimizerError::NoAvailableOfferError(OfferKind::Hotel));
        }

        let by_departure = flights.iter().all(|flight| flight.departs_at.is_some());
        let mut best: Option<PairCandidate> = None;
        let mut most_expensive: Option<PairCandidate> = None;
        let mut ranked: Vec<PairCandidate> = Vec::with_capacity(keep_ranked);
        let mut pairs_evaluated = 0;

        for flight in flights.iter().enumerate() {
            for hotel in hotels.iter().enumerate() {
                let candidate = Self::pair_candidate(flight, hotel, adults, by_departure)?;
                pairs_evaluated += 1;

                if best.map_or(true, |b| candidate.rank_key() < b.rank_key()) {
                    best = Some(candidate);
                }
                if most_expensive.map_or(true, |m| candidate.total > m.total) {
                    most_expensive = Some(candidate);
                }

                if keep_ranked > 0 {
                    let key = candidate.rank_key();
                    let position = ranked.partition_point(|c| c.rank_key() < key);
                    if position < keep_ranked {
                        ranked.insert(position, candidate);
                        ranked.truncate(keep_ranked);
                    }
                }
            }
        }

        match (best, most_expensive) {
            (Some(best), Some(most_expensive)) => Ok(PairEvaluation {
                best,
                most_expensive,
                pairs_evaluated,
                ranked,
            }),
            _ => Err(OptimizerError::NoAvailableOfferError(OfferKind::Hotel)),
        }
    }

    /// Picks up to `max_activities` offers by ascending price, input order breaking ties.
    /// This runs after the flight+hotel choice and never influences it.
    pub fn select_activities(&self, activities: &[PricedOffer]) -> Vec<PricedOffer> {
        let mut by_price: Vec<&PricedOffer> = activities.iter().collect();
        by_price.sort_by_key(|activity| activity.unit_price);
        by_price
            .into_iter()
            .take(self.max_activities)
            .cloned()
            .collect()
    }

    /// Builds the package for an already evaluated pair.
    pub fn assemble(
        &self,
        pair: &PairCandidate,
        flights: &[PricedOffer],
        hotels: &[StayPricedHotel],
        activities: &[PricedOffer],
        adults: u32,
        nights: u32,
    ) -> Result<BestPackage> {
        let (flight, hotel) = match (flights.get(pair.flight_index), hotels.get(pair.hotel_index)) {
            (Some(flight), Some(hotel)) => (flight.clone(), hotel.offer.clone()),
            _ => {
                return Err(OptimizerError::ConfigurationError(format!(
                    "pair ({}, {}) is outside the offer lists",
                    pair.flight_index, pair.hotel_index
                )))
            }
        };

        let chosen_activities = self.select_activities(activities);
        let activities_total = chosen_activities.iter().try_fold(0u64, |sum, activity| {
            sum.checked_add(activity.unit_price).ok_or_else(|| {
                OptimizerError::malformed(OfferKind::Activity, &activity.id, "price is too large")
            })
        })?;

        // Only reachable with activities, since the pair total was already checked
        let cost = PackageCost::new(pair.flight_total, pair.hotel_total, activities_total)
            .ok_or_else(|| {
                let id = chosen_activities.last().map_or("?", |a| a.id.as_str());
                OptimizerError::malformed(OfferKind::Activity, id, "package total is too large")
            })?;

        debug!(
            flight = %flight.id,
            hotel = %hotel.id,
            activities = chosen_activities.len(),
            grand_total = cost.grand_total(),
            "assembled package"
        );

        Ok(BestPackage::new(
            flight,
            hotel,
            chosen_activities,
            cost,
            nights,
            adults,
        ))
    }

    /// Cheapest flight+hotel combination, then the cheapest activities on top.
    pub fn compose(
        &self,
        flights: &[PricedOffer],
        hotels: &[StayPricedHotel],
        activities: &[PricedOffer],
        adults: u32,
        nights: u32,
    ) -> Result<BestPackage> {
        let evaluation = self.evaluate_pairs(flights, hotels, adults, 0)?;
        self.assemble(&evaluation.best, flights, hotels, activities, adults, nights)
    }
}
