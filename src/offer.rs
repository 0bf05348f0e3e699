// Core data model shared by the normalizer, stay calculator and composer
use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::{OptimizerError, Result};

// Kind of bookable item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OfferKind {
    Flight,
    Hotel,
    Activity,
}

impl fmt::Display for OfferKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OfferKind::Flight => write!(f, "flight"),
            OfferKind::Hotel => write!(f, "hotel"),
            OfferKind::Activity => write!(f, "activity"),
        }
    }
}

impl OfferKind {
    /// Unit assumed when the provider does not say how the price is quoted.
    pub fn default_unit(self) -> PriceUnit {
        match self {
            OfferKind::Flight | OfferKind::Activity => PriceUnit::PerItem,
            OfferKind::Hotel => PriceUnit::PerNight,
        }
    }
}

// Pricing granularity of a unit price
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceUnit {
    PerItem,
    PerNight,
    PerStay,
}

impl PriceUnit {
    /// Hotels may be quoted per night or for the whole stay; everything else is per item.
    pub fn is_valid_for(self, kind: OfferKind) -> bool {
        match kind {
            OfferKind::Flight | OfferKind::Activity => self == PriceUnit::PerItem,
            OfferKind::Hotel => matches!(self, PriceUnit::PerNight | PriceUnit::PerStay),
        }
    }
}

/// ISO 4217 currency code, stored upper-case.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Currency(String);

impl Currency {
    pub fn parse(code: &str) -> Option<Self> {
        let code = code.trim();
        if code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic()) {
            Some(Currency(code.to_ascii_uppercase()))
        } else {
            None
        }
    }

    pub fn code(&self) -> &str {
        &self.0
    }

    /// Number of decimal places in one major unit.
    pub fn minor_unit_exponent(&self) -> u32 {
        match self.0.as_str() {
            "BIF" | "CLP" | "DJF" | "GNF" | "ISK" | "JPY" | "KMF" | "KRW" | "PYG" | "RWF"
            | "UGX" | "VND" | "VUV" | "XAF" | "XOF" | "XPF" => 0,
            "BHD" | "IQD" | "JOD" | "KWD" | "LYD" | "OMR" | "TND" => 3,
            _ => 2,
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single bookable item with a comparable price in currency minor units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricedOffer {
    pub kind: OfferKind,
    pub id: String,
    pub display_name: String,
    pub unit_price: u64,
    pub currency: Currency,
    pub unit: PriceUnit,
    /// Provider-listed departure time, flights only. Used as the first tie-break.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub departs_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub raw_metadata: serde_json::Value,
}

impl PricedOffer {
    pub fn new(
        kind: OfferKind,
        id: impl Into<String>,
        display_name: impl Into<String>,
        unit_price: u64,
        currency: Currency,
        unit: PriceUnit,
    ) -> Result<Self> {
        let id = id.into();
        if !unit.is_valid_for(kind) {
            return Err(OptimizerError::malformed(
                kind,
                &id,
                format!("{:?} pricing is not valid for a {} offer", unit, kind),
            ));
        }

        Ok(Self {
            kind,
            id,
            display_name: display_name.into(),
            unit_price,
            currency,
            unit,
            departs_at: None,
            raw_metadata: serde_json::Value::Null,
        })
    }

    pub fn with_departure(mut self, departs_at: NaiveDateTime) -> Self {
        self.departs_at = Some(departs_at);
        self
    }

    pub fn with_metadata(mut self, raw_metadata: serde_json::Value) -> Self {
        self.raw_metadata = raw_metadata;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TripRequest {
    pub origin: String,
    pub destination: String,
    pub departure_date: NaiveDate,
    pub return_date: Option<NaiveDate>,
    pub adults: u32,
}

impl TripRequest {
    pub fn round_trip(
        origin: impl Into<String>,
        destination: impl Into<String>,
        departure_date: NaiveDate,
        return_date: NaiveDate,
        adults: u32,
    ) -> Self {
        Self {
            origin: origin.into(),
            destination: destination.into(),
            departure_date,
            return_date: Some(return_date),
            adults,
        }
    }
}

// Shape used to read a persisted cost back in; the total is checked, never trusted
#[derive(Deserialize)]
struct PackageCostRecord {
    flight_total: u64,
    hotel_total: u64,
    activities_total: u64,
    grand_total: u64,
}

/// Cost breakdown of a package. The grand total is always derived from the parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "PackageCostRecord")]
pub struct PackageCost {
    flight_total: u64,
    hotel_total: u64,
    activities_total: u64,
    grand_total: u64,
}

impl PackageCost {
    /// Returns `None` if the sum does not fit in a `u64`.
    pub fn new(flight_total: u64, hotel_total: u64, activities_total: u64) -> Option<Self> {
        let grand_total = flight_total
            .checked_add(hotel_total)?
            .checked_add(activities_total)?;
        Some(Self {
            flight_total,
            hotel_total,
            activities_total,
            grand_total,
        })
    }

    pub fn flight_total(&self) -> u64 {
        self.flight_total
    }

    pub fn hotel_total(&self) -> u64 {
        self.hotel_total
    }

    pub fn activities_total(&self) -> u64 {
        self.activities_total
    }

    pub fn grand_total(&self) -> u64 {
        self.grand_total
    }
}

impl TryFrom<PackageCostRecord> for PackageCost {
    type Error = String;

    fn try_from(record: PackageCostRecord) -> std::result::Result<Self, Self::Error> {
        let cost = PackageCost::new(
            record.flight_total,
            record.hotel_total,
            record.activities_total,
        )
        .ok_or_else(|| "package cost overflows".to_string())?;

        if cost.grand_total != record.grand_total {
            return Err(format!(
                "grand_total {} does not match the sum of its parts ({})",
                record.grand_total, cost.grand_total
            ));
        }
        Ok(cost)
    }
}

/// The selected combination for one trip request. Never mutated after construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BestPackage {
    flight: PricedOffer,
    hotel: PricedOffer,
    activities: Vec<PricedOffer>,
    cost: PackageCost,
    currency: Currency,
    nights: u32,
    adults: u32,
}

impl BestPackage {
    pub(crate) fn new(
        flight: PricedOffer,
        hotel: PricedOffer,
        activities: Vec<PricedOffer>,
        cost: PackageCost,
        nights: u32,
        adults: u32,
    ) -> Self {
        let currency = flight.currency.clone();
        Self {
            flight,
            hotel,
            activities,
            cost,
            currency,
            nights,
            adults,
        }
    }

    pub fn flight(&self) -> &PricedOffer {
        &self.flight
    }

    pub fn hotel(&self) -> &PricedOffer {
        &self.hotel
    }

    pub fn activities(&self) -> &[PricedOffer] {
        &self.activities
    }

    pub fn cost(&self) -> &PackageCost {
        &self.cost
    }

    pub fn currency(&self) -> &Currency {
        &self.currency
    }

    pub fn nights(&self) -> u32 {
        self.nights
    }

    pub fn adults(&self) -> u32 {
        self.adults
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(OfferKind::Flight, PriceUnit::PerItem, true; "flight per item")]
    #[test_case(OfferKind::Flight, PriceUnit::PerNight, false; "flight per night")]
    #[test_case(OfferKind::Hotel, PriceUnit::PerNight, true; "hotel per night")]
    #[test_case(OfferKind::Hotel, PriceUnit::PerStay, true; "hotel per stay")]
    #[test_case(OfferKind::Hotel, PriceUnit::PerItem, false; "hotel per item")]
    #[test_case(OfferKind::Activity, PriceUnit::PerItem, true; "activity per item")]
    #[test_case(OfferKind::Activity, PriceUnit::PerStay, false; "activity per stay")]
    fn test_unit_consistency(kind: OfferKind, unit: PriceUnit, valid: bool) {
        assert_eq!(unit.is_valid_for(kind), valid);
    }

    #[test]
    fn test_priced_offer_rejects_inconsistent_unit() {
        let usd = Currency::parse("usd").unwrap();
        let result = PricedOffer::new(OfferKind::Flight, "F1", "Flight", 100, usd, PriceUnit::PerNight);
        assert!(matches!(
            result,
            Err(OptimizerError::MalformedOfferError { ref offer_id, .. }) if offer_id == "F1"
        ));
    }

    #[test_case("usd", Some("USD"); "lower case")]
    #[test_case(" EUR ", Some("EUR"); "padded")]
    #[test_case("EURO", None; "too long")]
    #[test_case("U$D", None; "symbol")]
    #[test_case("", None; "empty")]
    fn test_currency_parse(input: &str, expected: Option<&str>) {
        assert_eq!(Currency::parse(input).as_ref().map(Currency::code), expected);
    }

    #[test]
    fn test_currency_exponent() {
        assert_eq!(Currency::parse("JPY").unwrap().minor_unit_exponent(), 0);
        assert_eq!(Currency::parse("KWD").unwrap().minor_unit_exponent(), 3);
        assert_eq!(Currency::parse("GBP").unwrap().minor_unit_exponent(), 2);
    }

    #[test]
    fn test_package_cost_sums_parts() {
        let cost = PackageCost::new(300, 400, 80).unwrap();
        assert_eq!(cost.grand_total(), 780);
        assert!(PackageCost::new(u64::MAX, 1, 0).is_none());
    }

    #[test]
    fn test_package_cost_rejects_drifted_total() {
        let json = r#"{"flight_total":300,"hotel_total":400,"activities_total":80,"grand_total":781}"#;
        assert!(serde_json::from_str::<PackageCost>(json).is_err());

        let json = r#"{"flight_total":300,"hotel_total":400,"activities_total":80,"grand_total":780}"#;
        let cost: PackageCost = serde_json::from_str(json).unwrap();
        assert_eq!(cost, PackageCost::new(300, 400, 80).unwrap());
    }
}
