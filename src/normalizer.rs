// Offer normalization: raw provider offers into comparable priced offers
use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{OptimizerError, Result};
use crate::offer::{Currency, OfferKind, PriceUnit, PricedOffer};

/// An offer as the provider quoted it, before any validation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawOffer {
    pub kind: Option<OfferKind>,
    pub id: Option<String>,
    pub display_name: Option<String>,
    pub amount: Option<String>,
    pub currency: Option<String>,
    pub unit: Option<PriceUnit>,
    pub departs_at: Option<String>,
    pub metadata: serde_json::Value,
}

impl RawOffer {
    pub fn new(kind: OfferKind, id: impl Into<String>) -> Self {
        Self {
            kind: Some(kind),
            id: Some(id.into()),
            ..Default::default()
        }
    }

    pub fn priced(mut self, amount: impl Into<String>, currency: impl Into<String>) -> Self {
        self.amount = Some(amount.into());
        self.currency = Some(currency.into());
        self
    }
}

#[derive(Debug, Default, Clone)]
pub struct OfferNormalizer {}

impl OfferNormalizer {
    pub fn new() -> Self {
        Self {}
    }

    /// Normalizes a single offer. Pure: no state is kept between calls.
    pub fn normalize(&self, raw: RawOffer) -> Result<PricedOffer> {
        let kind = raw.kind.ok_or_else(|| OptimizerError::UnclassifiedOfferError {
            offer_id: raw.id.clone().unwrap_or_else(|| "?".to_string()),
        })?;

        let id = match raw.id.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => return Err(OptimizerError::malformed(kind, "?", "missing offer id")),
        };

        let currency_code = raw
            .currency
            .as_deref()
            .ok_or_else(|| OptimizerError::malformed(kind, &id, "missing currency"))?;
        let currency = Currency::parse(currency_code).ok_or_else(|| {
            OptimizerError::malformed(kind, &id, format!("invalid currency '{}'", currency_code))
        })?;

        let amount = raw
            .amount
            .as_deref()
            .ok_or_else(|| OptimizerError::malformed(kind, &id, "missing price"))?;
        let unit_price = to_minor_units(amount, &currency)
            .map_err(|reason| OptimizerError::malformed(kind, &id, reason))?;

        let unit = raw.unit.unwrap_or_else(|| kind.default_unit());
        let display_name = raw
            .display_name
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| id.clone());

        let mut offer = PricedOffer::new(kind, id, display_name, unit_price, currency, unit)?
            .with_metadata(raw.metadata);

        if let Some(departs_at) = raw.departs_at.as_deref() {
            let parsed = parse_departure(departs_at).ok_or_else(|| {
                OptimizerError::malformed(
                    kind,
                    &offer.id,
                    format!("unreadable departure time '{}'", departs_at),
                )
            })?;
            offer = offer.with_departure(parsed);
        }

        debug!(
            kind = %offer.kind,
            id = %offer.id,
            unit_price = offer.unit_price,
            currency = %offer.currency,
            "normalized offer"
        );
        Ok(offer)
    }

    /// Normalizes every offer, failing on the first malformed one.
    pub fn normalize_all(&self, raws: impl IntoIterator<Item = RawOffer>) -> Result<Vec<PricedOffer>> {
        raws.into_iter().map(|raw| self.normalize(raw)).collect()
    }
}

/// Converts a decimal amount string into integer minor units of `currency`.
pub fn to_minor_units(amount: &str, currency: &Currency) -> std::result::Result<u64, String> {
    let trimmed = amount.trim();
    if trimmed.is_empty() {
        return Err("empty price".to_string());
    }

    let value = Decimal::from_str(trimmed)
        .map_err(|_| format!("non-numeric price '{}'", trimmed))?;
    if value.is_sign_negative() && !value.is_zero() {
        return Err(format!("negative price '{}'", trimmed));
    }

    let exponent = currency.minor_unit_exponent();
    if value.normalize().scale() > exponent {
        return Err(format!(
            "price '{}' has more than {} decimal places for {}",
            trimmed, exponent, currency
        ));
    }

    value
        .checked_mul(Decimal::from(10u64.pow(exponent)))
        .and_then(|minor| minor.to_u64())
        .ok_or_else(|| format!("price '{}' is too large", trimmed))
}

fn parse_departure(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if let Ok(with_offset) = DateTime::parse_from_rfc3339(value) {
        // Local wall-clock time at the departure airport
        return Some(with_offset.naive_local());
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M"))
        .ok()
}
