//! Money type with decimal precision and currency.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! This type wraps `rust_decimal::Decimal` for arbitrary precision.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Represents a monetary amount with currency.
///
/// Uses `Decimal` internally to avoid floating-point precision errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    /// The amount in whole currency units (fractions allowed).
    pub amount: Decimal,
    /// Currency or asset code.
    pub currency: Currency,
}

/// Fiat currencies and digital assets handled by the custody desk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    /// Korean Won
    Krw,
    /// US Dollar
    Usd,
    /// Bitcoin
    Btc,
    /// Ether
    Eth,
    /// USD Coin
    Usdc,
    /// Tether
    Usdt,
}

impl Currency {
    /// All supported currencies, in display order.
    pub const ALL: [Self; 6] = [
        Self::Krw,
        Self::Usd,
        Self::Btc,
        Self::Eth,
        Self::Usdc,
        Self::Usdt,
    ];

    /// Returns the currency code.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Krw => "KRW",
            Self::Usd => "USD",
            Self::Btc => "BTC",
            Self::Eth => "ETH",
            Self::Usdc => "USDC",
            Self::Usdt => "USDT",
        }
    }

    /// Number of fractional digits the currency is accounted in.
    #[must_use]
    pub const fn decimal_places(&self) -> u32 {
        match self {
            Self::Krw => 0,
            Self::Usd => 2,
            Self::Btc => 8,
            Self::Eth => 18,
            Self::Usdc | Self::Usdt => 6,
        }
    }
}

impl Money {
    /// Creates a new Money instance.
    #[must_use]
    pub const fn new(amount: Decimal, currency: Currency) -> Self {
        Self { amount, currency }
    }

    /// Returns true if the amount is zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }

    /// Returns true if the amount is negative.
    #[must_use]
    pub fn is_negative(&self) -> bool {
        self.amount.is_sign_negative() && !self.amount.is_zero()
    }
}

/// Formats an amount with thousands separators, e.g. `10000000` -> `10,000,000`.
#[must_use]
pub fn format_grouped(amount: Decimal) -> String {
    let normalized = amount.normalize().to_string();
    let (sign, unsigned) = normalized
        .strip_prefix('-')
        .map_or(("", normalized.as_str()), |rest| ("-", rest));
    let (int_part, frac_part) = unsigned
        .split_once('.')
        .map_or((unsigned, None), |(i, f)| (i, Some(f)));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (idx, ch) in int_part.chars().enumerate() {
        if idx > 0 && (int_part.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    match frac_part {
        Some(frac) => format!("{sign}{grouped}.{frac}"),
        None => format!("{sign}{grouped}"),
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", format_grouped(self.amount), self.currency)
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Currency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "KRW" => Ok(Self::Krw),
            "USD" => Ok(Self::Usd),
            "BTC" => Ok(Self::Btc),
            "ETH" => Ok(Self::Eth),
            "USDC" => Ok(Self::Usdc),
            "USDT" => Ok(Self::Usdt),
            _ => Err(format!("Unknown currency: {s}")),
        }
    }
}
