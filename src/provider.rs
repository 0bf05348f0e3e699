// Data structures for provider search payloads (flight offers, hotel offers, activities)
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{OptimizerError, Result};
use crate::normalizer::RawOffer;
use crate::offer::{OfferKind, PriceUnit};

// Every provider search answers with a `data` array
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SearchEnvelope {
    data: Vec<Value>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FlightOffer {
    pub id: Option<String>,
    pub price: FlightPrice,
    pub validating_airline_codes: Vec<String>,
    pub itineraries: Vec<Itinerary>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FlightPrice {
    pub total: Option<Value>,
    pub currency: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Itinerary {
    pub duration: Option<String>,
    pub segments: Vec<Segment>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Segment {
    pub departure: Endpoint,
    pub arrival: Endpoint,
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Endpoint {
    pub iata_code: Option<String>,
    pub at: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct HotelOffers {
    pub hotel: HotelInfo,
    pub offers: Vec<HotelOffer>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HotelInfo {
    pub hotel_id: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct HotelOffer {
    pub id: Option<String>,
    pub price: HotelPrice,
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct HotelPrice {
    pub currency: Option<String>,
    pub total: Option<Value>,
    pub variations: Option<PriceVariations>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct PriceVariations {
    pub average: Option<AveragePrice>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AveragePrice {
    pub total: Option<Value>,
    pub base: Option<Value>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Activity {
    pub id: Option<Value>,
    pub name: Option<String>,
    pub short_description: Option<String>,
    pub price: ActivityPrice,
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ActivityPrice {
    pub amount: Option<Value>,
    pub currency_code: Option<String>,
}

// Providers send prices as strings, occasionally as bare numbers
fn amount_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        other => Some(other.to_string()),
    }
}

fn id_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

fn parse_payload(json: &str, what: &str) -> Result<Value> {
    serde_json::from_str(json)
        .map_err(|e| OptimizerError::PayloadError(format!("{} search: {}", what, e)))
}

fn records<T: DeserializeOwned>(payload: Value, what: &str) -> Result<Vec<(T, Value)>> {
    // A null payload means the search was never run
    if payload.is_null() {
        return Ok(Vec::new());
    }

    let envelope: SearchEnvelope = serde_json::from_value(payload)
        .map_err(|e| OptimizerError::PayloadError(format!("{} search: {}", what, e)))?;

    envelope
        .data
        .into_iter()
        .map(|record| {
            let typed = serde_json::from_value(record.clone()).map_err(|e| {
                OptimizerError::PayloadError(format!("{} record: {}", what, e))
            })?;
            Ok((typed, record))
        })
        .collect()
}

impl FlightOffer {
    pub fn into_raw(self, record: Value) -> RawOffer {
        let outbound = self.itineraries.first();
        let segments = outbound.map(|it| it.segments.as_slice()).unwrap_or_default();
        let airline = self
            .validating_airline_codes
            .first()
            .cloned()
            .unwrap_or_else(|| "N/A".to_string());
        let from = segments.first().and_then(|s| s.departure.iata_code.clone());
        let to = segments.last().and_then(|s| s.arrival.iata_code.clone());

        let display_name = match (from, to) {
            (Some(from), Some(to)) => format!("{} {}-{}", airline, from, to),
            _ => airline.clone(),
        };

        RawOffer {
            kind: Some(OfferKind::Flight),
            id: self.id,
            display_name: Some(display_name),
            amount: amount_text(self.price.total.as_ref()),
            currency: self.price.currency,
            unit: Some(PriceUnit::PerItem),
            departs_at: segments.first().and_then(|s| s.departure.at.clone()),
            metadata: json!({
                "airline": airline,
                "duration": outbound.and_then(|it| it.duration.clone()).unwrap_or_else(|| "N/A".to_string()),
                "stops": segments.len().saturating_sub(1),
                "offer": record,
            }),
        }
    }
}

impl HotelOffers {
    /// Uses the first offer of the hotel. Hotels listed without offers yield `None`.
    ///
    /// The provider's `total` covers the whole stay; when a per-night average
    /// `total` is present that is used instead so the stay calculator can scale it.
    /// The average `base` excludes taxes and is never used as a price.
    pub fn into_raw(self, record: Value) -> Option<RawOffer> {
        let offer = self.offers.into_iter().next()?;
        let average = offer
            .price
            .variations
            .as_ref()
            .and_then(|v| v.average.as_ref())
            .and_then(|avg| amount_text(avg.total.as_ref()));

        let (amount, unit) = match average {
            Some(per_night) => (Some(per_night), PriceUnit::PerNight),
            None => (amount_text(offer.price.total.as_ref()), PriceUnit::PerStay),
        };

        Some(RawOffer {
            kind: Some(OfferKind::Hotel),
            id: self.hotel.hotel_id,
            display_name: Some(self.hotel.name.unwrap_or_else(|| "Unknown Hotel".to_string())),
            amount,
            currency: offer.price.currency,
            unit: Some(unit),
            departs_at: None,
            metadata: json!({ "offer_id": offer.id, "hotel": record }),
        })
    }
}

impl Activity {
    /// Activities listed without a price yield `None`, like unpriced hotels.
    pub fn into_raw(self, record: Value) -> Option<RawOffer> {
        let amount = amount_text(self.price.amount.as_ref())?;
        Some(RawOffer {
            kind: Some(OfferKind::Activity),
            id: id_text(self.id.as_ref()),
            display_name: Some(self.name.unwrap_or_else(|| "Unknown Activity".to_string())),
            amount: Some(amount),
            currency: self.price.currency_code,
            unit: Some(PriceUnit::PerItem),
            departs_at: None,
            metadata: json!({
                "description": self
                    .short_description
                    .unwrap_or_else(|| "No description available".to_string()),
                "activity": record,
            }),
        })
    }
}

/// Reads an already decoded flight-offers search response.
pub fn flight_offers_from_value(payload: Value) -> Result<Vec<RawOffer>> {
    Ok(records::<FlightOffer>(payload, "flight")?
        .into_iter()
        .map(|(offer, record)| offer.into_raw(record))
        .collect())
}

/// Reads an already decoded hotel-offers search response, skipping hotels that came back unpriced.
pub fn hotel_offers_from_value(payload: Value) -> Result<Vec<RawOffer>> {
    Ok(records::<HotelOffers>(payload, "hotel")?
        .into_iter()
        .filter_map(|(hotel, record)| hotel.into_raw(record))
        .collect())
}

/// Reads an already decoded activities search response, skipping unpriced activities.
pub fn activities_from_value(payload: Value) -> Result<Vec<RawOffer>> {
    Ok(records::<Activity>(payload, "activity")?
        .into_iter()
        .filter_map(|(activity, record)| activity.into_raw(record))
        .collect())
}

pub fn parse_flight_offers(json: &str) -> Result<Vec<RawOffer>> {
    flight_offers_from_value(parse_payload(json, "flight")?)
}

pub fn parse_hotel_offers(json: &str) -> Result<Vec<RawOffer>> {
    hotel_offers_from_value(parse_payload(json, "hotel")?)
}

pub fn parse_activities(json: &str) -> Result<Vec<RawOffer>> {
    activities_from_value(parse_payload(json, "activity")?)
}
