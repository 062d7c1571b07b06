//! Currency conversion and exchange-rate lookup.
//!
//! Policy bands are denominated in a single base currency, so every
//! amount is normalized through a [`RateProvider`] before banding.

pub mod conversion;
pub mod rates;

pub use conversion::convert_amount;
pub use rates::{ExchangeRate, FixedRateTable, RateProvider, RateTableError};
