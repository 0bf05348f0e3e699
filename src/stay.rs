// Stay calculation: nights between travel dates and whole-stay hotel pricing
use chrono::NaiveDate;
use serde::Serialize;

use crate::error::{OptimizerError, Result};
use crate::offer::{OfferKind, PriceUnit, PricedOffer};

/// Whole nights between departure and return. Same-day or inverted ranges are rejected.
pub fn stay_duration(departure_date: NaiveDate, return_date: Option<NaiveDate>) -> Result<u32> {
    let invalid = || OptimizerError::InvalidDateRangeError {
        departure_date,
        return_date,
    };

    let return_date = return_date.ok_or_else(invalid)?;
    let nights = (return_date - departure_date).num_days();
    if nights < 1 {
        return Err(invalid());
    }
    u32::try_from(nights).map_err(|_| invalid())
}

/// A hotel offer together with what it costs for the whole stay.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StayPricedHotel {
    pub offer: PricedOffer,
    pub stay_total: u64,
}

/// Prices a hotel for `nights`. The unit tag decides whether the rate is scaled.
pub fn price_stay(offer: PricedOffer, nights: u32) -> Result<StayPricedHotel> {
    if offer.kind != OfferKind::Hotel {
        return Err(OptimizerError::ConfigurationError(format!(
            "{} offer '{}' was supplied as a hotel",
            offer.kind, offer.id
        )));
    }

    let stay_total = match offer.unit {
        PriceUnit::PerNight => offer.unit_price.checked_mul(u64::from(nights)).ok_or_else(|| {
            OptimizerError::malformed(OfferKind::Hotel, &offer.id, "stay price is too large")
        })?,
        PriceUnit::PerStay => offer.unit_price,
        PriceUnit::PerItem => {
            return Err(OptimizerError::ConfigurationError(format!(
                "hotel offer '{}' is priced per item",
                offer.id
            )))
        }
    };

    Ok(StayPricedHotel { offer, stay_total })
}

pub fn price_stays(hotels: Vec<PricedOffer>, nights: u32) -> Result<Vec<StayPricedHotel>> {
    hotels
        .into_iter()
        .map(|hotel| price_stay(hotel, nights))
        .collect()
}
