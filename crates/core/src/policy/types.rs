//! Policy domain types.

use std::fmt;

use custody_shared::types::Currency;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Identifier of a required approver (a role such as `CFO`, or a named person).
///
/// Required-approver entries and acting user names are compared verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Approver(String);

impl Approver {
    /// Creates an approver identifier, trimming surrounding whitespace.
    #[must_use]
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(name.as_ref().trim().to_string())
    }

    /// Returns the identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if the identifier is empty.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for Approver {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl fmt::Display for Approver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Risk tag attached to a transaction that pulls in extra approvers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    /// Flagged by risk screening.
    HighRisk,
    /// Destination is in another jurisdiction.
    CrossBorder,
    /// Exceeds the desk's single-ticket threshold.
    LargeValue,
    /// Destination address was whitelisted recently.
    NewAddress,
}

impl TransactionType {
    /// Returns the string representation of the tag.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HighRisk => "high_risk",
            Self::CrossBorder => "cross_border",
            Self::LargeValue => "large_value",
            Self::NewAddress => "new_address",
        }
    }

    /// Parses a tag from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "high_risk" => Some(Self::HighRisk),
            "cross_border" => Some(Self::CrossBorder),
            "large_value" => Some(Self::LargeValue),
            "new_address" => Some(Self::NewAddress),
            _ => None,
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An amount band for one currency and the approvers it requires.
///
/// The band covers `[min_amount, max_amount)` in base-currency units;
/// `max_amount = None` means unbounded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalPolicy {
    /// Currency the band applies to.
    pub currency: Currency,
    /// Lower bound (inclusive).
    pub min_amount: Decimal,
    /// Upper bound (exclusive), `None` for no upper bound.
    pub max_amount: Option<Decimal>,
    /// Approvers in the order they must act.
    pub required_approvers: Vec<Approver>,
    /// Human-readable description of the band.
    pub description: String,
}

impl ApprovalPolicy {
    /// Returns true if `amount` falls inside this band.
    #[must_use]
    pub fn contains(&self, amount: Decimal) -> bool {
        amount >= self.min_amount && self.max_amount.is_none_or(|max| amount < max)
    }
}

/// Approvers appended when a transaction carries a given tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionTypePolicy {
    /// The tag this policy applies to.
    pub transaction_type: TransactionType,
    /// Human-readable description.
    pub description: String,
    /// Approvers appended after the amount-band approvers.
    pub additional_approvers: Vec<Approver>,
}

/// Result of [`describe_policy`](crate::policy::PolicyResolver::describe_policy).
#[derive(Debug, Clone, Serialize)]
pub struct PolicyDescription {
    /// Currency of the requested amount.
    pub currency: Currency,
    /// Requested amount.
    pub amount: Decimal,
    /// Currency policy bands are denominated in.
    pub base_currency: Currency,
    /// Amount converted into the base currency.
    pub normalized_amount: Decimal,
    /// The matched amount band.
    pub band: ApprovalPolicy,
    /// The matched transaction-type policy, if any.
    pub type_policy: Option<TransactionTypePolicy>,
    /// The resolved approver chain.
    pub required_approvers: Vec<Approver>,
    /// One-line summary for display.
    pub summary: String,
}
