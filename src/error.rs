// Error types for package optimization
use chrono::NaiveDate;
use thiserror::Error;

use crate::offer::OfferKind;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OptimizerError {
    #[error("Malformed {kind} offer '{offer_id}': {reason}")]
    MalformedOfferError {
        kind: OfferKind,
        offer_id: String,
        reason: String,
    },

    /// An offer that cannot be told apart as a flight, hotel or activity.
    #[error("Malformed offer '{offer_id}': missing offer kind")]
    UnclassifiedOfferError { offer_id: String },

    #[error("Invalid date range: {} {departure_date}", describe_return(.return_date))]
    InvalidDateRangeError {
        departure_date: NaiveDate,
        return_date: Option<NaiveDate>,
    },

    #[error("Invalid traveler count: {0} (at least one adult is required)")]
    InvalidTravelerCountError(u32),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("No available {0} offers")]
    NoAvailableOfferError(OfferKind),

    #[error("Provider payload error: {0}")]
    PayloadError(String),
}

impl OptimizerError {
    pub(crate) fn malformed(kind: OfferKind, offer_id: &str, reason: impl Into<String>) -> Self {
        OptimizerError::MalformedOfferError {
            kind,
            offer_id: offer_id.to_string(),
            reason: reason.into(),
        }
    }

    /// Nothing produced by the optimizer is worth retrying with the same input.
    pub fn is_retryable(&self) -> bool {
        false
    }

    /// Bad input from the traveler or the offer feed; maps to a 4xx-style response.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            OptimizerError::MalformedOfferError { .. }
                | OptimizerError::UnclassifiedOfferError { .. }
                | OptimizerError::InvalidDateRangeError { .. }
                | OptimizerError::InvalidTravelerCountError(_)
                | OptimizerError::PayloadError(_)
        )
    }

    /// Integration bug upstream of the optimizer. Log it, don't show it raw.
    pub fn is_defect(&self) -> bool {
        matches!(self, OptimizerError::ConfigurationError(_))
    }

    /// A legitimate empty search, rendered as "no deals found".
    pub fn is_no_results(&self) -> bool {
        matches!(self, OptimizerError::NoAvailableOfferError(_))
    }
}

pub type Result<T> = std::result::Result<T, OptimizerError>;

fn describe_return(return_date: &Option<NaiveDate>) -> String {
    match return_date {
        Some(date) => format!("return {} must be after departure", date),
        None => "return date is missing for departure".to_string(),
    }
}
