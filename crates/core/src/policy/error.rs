//! Policy resolution errors.

use custody_shared::types::Currency;
use rust_decimal::Decimal;
use thiserror::Error;

/// Errors that can occur while resolving required approvers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
    /// No band covers the amount for this currency.
    ///
    /// This is a configuration gap and must never fall back to an empty
    /// approver list.
    #[error("No approval policy covers {amount} {currency}")]
    PolicyNotFound {
        /// Requested currency.
        currency: Currency,
        /// Requested amount.
        amount: Decimal,
    },

    /// The amount is negative.
    #[error("Amount must not be negative: {0}")]
    NegativeAmount(Decimal),

    /// The amount is too large to normalize into the base currency.
    #[error("Amount {amount} {currency} is out of range")]
    AmountOutOfRange {
        /// Requested currency.
        currency: Currency,
        /// Requested amount.
        amount: Decimal,
    },

    /// No exchange rate is available to normalize the amount.
    #[error("No exchange rate from {from} to {to}")]
    RateUnavailable {
        /// Source currency.
        from: Currency,
        /// Base currency.
        to: Currency,
    },

    /// The policy table violates its structural invariants.
    #[error("Invalid policy table: {0}")]
    InvalidPolicyTable(String),
}

impl PolicyError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::NegativeAmount(_) => 400,
            Self::PolicyNotFound { .. }
            | Self::AmountOutOfRange { .. }
            | Self::RateUnavailable { .. } => 422,
            Self::InvalidPolicyTable(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::PolicyNotFound { .. } => "POLICY_NOT_FOUND",
            Self::NegativeAmount(_) => "NEGATIVE_AMOUNT",
            Self::AmountOutOfRange { .. } => "AMOUNT_OUT_OF_RANGE",
            Self::RateUnavailable { .. } => "RATE_UNAVAILABLE",
            Self::InvalidPolicyTable(_) => "INVALID_POLICY_TABLE",
        }
    }
}
