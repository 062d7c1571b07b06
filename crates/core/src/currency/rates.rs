//! Exchange rate types and lookup.

use std::collections::HashMap;
use std::str::FromStr;

use custody_shared::RatesConfig;
use custody_shared::types::Currency;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Exchange rate between two currencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeRate {
    /// Source currency.
    pub from_currency: Currency,
    /// Target currency.
    pub to_currency: Currency,
    /// Exchange rate (1 from_currency = rate to_currency).
    pub rate: Decimal,
}

impl ExchangeRate {
    /// Creates a new exchange rate.
    #[must_use]
    pub const fn new(from_currency: Currency, to_currency: Currency, rate: Decimal) -> Self {
        Self {
            from_currency,
            to_currency,
            rate,
        }
    }
}

/// Source of exchange rates used for amount normalization.
///
/// Implementations must be deterministic for the lifetime of a resolver
/// so that policy resolution stays a pure function of its inputs.
pub trait RateProvider: Send + Sync {
    /// Returns the rate converting one unit of `from` into `to`, if known.
    fn rate(&self, from: Currency, to: Currency) -> Option<ExchangeRate>;
}

/// Errors building a rate table from configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RateTableError {
    /// A currency code in configuration is not supported.
    #[error("Unsupported currency in rate table: {0}")]
    UnknownCurrency(String),

    /// A rate is zero or negative.
    #[error("Rate for {0} must be positive")]
    NonPositiveRate(Currency),

    /// The base currency does not have a rate of exactly one.
    #[error("Base currency {0} must have a rate of 1")]
    BaseRateNotOne(Currency),
}

/// A fixed, in-memory table of rates against one base currency.
#[derive(Debug, Clone)]
pub struct FixedRateTable {
    base: Currency,
    to_base: HashMap<Currency, Decimal>,
}

impl FixedRateTable {
    /// Creates a table with only the base currency.
    #[must_use]
    pub fn new(base: Currency) -> Self {
        let mut to_base = HashMap::new();
        to_base.insert(base, Decimal::ONE);
        Self { base, to_base }
    }

    /// Adds or replaces the rate of `currency` against the base currency.
    pub fn with_rate(mut self, currency: Currency, rate: Decimal) -> Result<Self, RateTableError> {
        if rate <= Decimal::ZERO {
            return Err(RateTableError::NonPositiveRate(currency));
        }
        if currency == self.base && rate != Decimal::ONE {
            return Err(RateTableError::BaseRateNotOne(currency));
        }
        self.to_base.insert(currency, rate);
        Ok(self)
    }

    /// Builds the table from the `rates` configuration section.
    pub fn from_config(config: &RatesConfig) -> Result<Self, RateTableError> {
        let base = Currency::from_str(&config.base_currency)
            .map_err(|_| RateTableError::UnknownCurrency(config.base_currency.clone()))?;

        config
            .table
            .iter()
            .try_fold(Self::new(base), |table, (code, rate)| {
                let currency = Currency::from_str(code)
                    .map_err(|_| RateTableError::UnknownCurrency(code.clone()))?;
                table.with_rate(currency, *rate)
            })
    }

    /// Returns the base currency.
    #[must_use]
    pub const fn base(&self) -> Currency {
        self.base
    }
}

impl RateProvider for FixedRateTable {
    fn rate(&self, from: Currency, to: Currency) -> Option<ExchangeRate> {
        if from == to {
            return Some(ExchangeRate::new(from, to, Decimal::ONE));
        }
        let from_base = self.to_base.get(&from)?;
        let to_base = self.to_base.get(&to)?;
        let rate = from_base.checked_div(*to_base)?;
        Some(ExchangeRate::new(from, to, rate))
    }
}
