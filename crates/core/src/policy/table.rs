//! Static policy tables and their structural validation.

use std::collections::{BTreeMap, HashSet};

use custody_shared::types::{Currency, format_grouped};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::policy::error::PolicyError;
use crate::policy::types::{ApprovalPolicy, Approver, TransactionType, TransactionTypePolicy};

/// Immutable set of approval and transaction-type policies.
///
/// Built once and handed to the resolver; nothing mutates it afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct PolicyTable {
    base_currency: Currency,
    approval_policies: Vec<ApprovalPolicy>,
    transaction_type_policies: Vec<TransactionTypePolicy>,
}

impl PolicyTable {
    /// Creates a table and validates its invariants.
    pub fn new(
        base_currency: Currency,
        approval_policies: Vec<ApprovalPolicy>,
        transaction_type_policies: Vec<TransactionTypePolicy>,
    ) -> Result<Self, PolicyError> {
        let table = Self {
            base_currency,
            approval_policies,
            transaction_type_policies,
        };
        table.validate()?;
        Ok(table)
    }

    /// The reference tables used by the custody desk.
    ///
    /// Fiat and stablecoins share thresholds; BTC and ETH escalate earlier.
    /// All thresholds are in KRW.
    #[must_use]
    pub fn reference() -> Self {
        const TEN_MILLION: i64 = 10_000_000;
        const FIVE_MILLION: i64 = 5_000_000;

        let mut approval_policies = Vec::new();
        for currency in Currency::ALL {
            let step = if matches!(currency, Currency::Btc | Currency::Eth) {
                FIVE_MILLION
            } else {
                TEN_MILLION
            };
            let low = Decimal::new(step, 0);
            let high = Decimal::new(step * 10, 0);

            approval_policies.push(band(currency, Decimal::ZERO, Some(low), &["CFO"]));
            approval_policies.push(band(currency, low, Some(high), &["CFO", "CISO"]));
            approval_policies.push(band(currency, high, None, &["CFO", "CISO", "CEO"]));
        }

        let transaction_type_policies = vec![
            type_policy(
                TransactionType::HighRisk,
                "High-risk counterparty review",
                &["Compliance Officer"],
            ),
            type_policy(
                TransactionType::CrossBorder,
                "Cross-border transfer review",
                &["Compliance Officer", "Legal Counsel"],
            ),
            type_policy(
                TransactionType::LargeValue,
                "Large-value sign-off",
                &["CEO"],
            ),
            type_policy(
                TransactionType::NewAddress,
                "Recently whitelisted destination",
                &["CISO"],
            ),
        ];

        Self {
            base_currency: Currency::Krw,
            approval_policies,
            transaction_type_policies,
        }
    }

    /// Currency that band thresholds are expressed in.
    #[must_use]
    pub const fn base_currency(&self) -> Currency {
        self.base_currency
    }

    /// All amount bands, in table order.
    #[must_use]
    pub fn approval_policies(&self) -> &[ApprovalPolicy] {
        &self.approval_policies
    }

    /// All transaction-type policies, in table order.
    #[must_use]
    pub fn transaction_type_policies(&self) -> &[TransactionTypePolicy] {
        &self.transaction_type_policies
    }

    /// Bands for one currency, in table order.
    pub fn policies_for(&self, currency: Currency) -> impl Iterator<Item = &ApprovalPolicy> {
        self.approval_policies
            .iter()
            .filter(move |p| p.currency == currency)
    }

    /// The policy for a transaction tag, if one exists.
    #[must_use]
    pub fn type_policy(&self, transaction_type: TransactionType) -> Option<&TransactionTypePolicy> {
        self.transaction_type_policies
            .iter()
            .find(|p| p.transaction_type == transaction_type)
    }

    /// Checks the structural invariants of the table.
    ///
    /// For each currency the bands must partition `[0, ∞)`: start at zero,
    /// touch without overlap and end unbounded. Every band needs at least
    /// one approver and no approver may appear twice in one list.
    pub fn validate(&self) -> Result<(), PolicyError> {
        let mut by_currency: BTreeMap<Currency, Vec<&ApprovalPolicy>> = BTreeMap::new();
        for policy in &self.approval_policies {
            check_approvers(
                &policy.required_approvers,
                &format!("{} band from {}", policy.currency, policy.min_amount),
            )?;
            if policy.required_approvers.is_empty() {
                return Err(PolicyError::InvalidPolicyTable(format!(
                    "{} band from {} has no approvers",
                    policy.currency, policy.min_amount
                )));
            }
            by_currency.entry(policy.currency).or_default().push(policy);
        }

        for (currency, mut bands) in by_currency {
            bands.sort_by_key(|p| p.min_amount);

            let mut expected_min = Decimal::ZERO;
            for (idx, policy) in bands.iter().enumerate() {
                if policy.min_amount != expected_min {
                    return Err(PolicyError::InvalidPolicyTable(format!(
                        "{currency} bands are not contiguous at {expected_min} (next band starts at {})",
                        policy.min_amount
                    )));
                }
                match policy.max_amount {
                    Some(max) if max <= policy.min_amount => {
                        return Err(PolicyError::InvalidPolicyTable(format!(
                            "{currency} band [{}, {max}) is empty",
                            policy.min_amount
                        )));
                    }
                    Some(max) => expected_min = max,
                    None if idx + 1 != bands.len() => {
                        return Err(PolicyError::InvalidPolicyTable(format!(
                            "{currency} has an unbounded band before the last one"
                        )));
                    }
                    None => {}
                }
            }

            if bands.last().and_then(|p| p.max_amount).is_some() {
                return Err(PolicyError::InvalidPolicyTable(format!(
                    "{currency} bands stop at {expected_min}"
                )));
            }
        }

        let mut seen_types = HashSet::new();
        for policy in &self.transaction_type_policies {
            if !seen_types.insert(policy.transaction_type) {
                return Err(PolicyError::InvalidPolicyTable(format!(
                    "duplicate policy for {}",
                    policy.transaction_type
                )));
            }
            check_approvers(
                &policy.additional_approvers,
                &format!("{} policy", policy.transaction_type),
            )?;
        }

        Ok(())
    }
}

fn check_approvers(approvers: &[Approver], context: &str) -> Result<(), PolicyError> {
    let mut seen = HashSet::new();
    for approver in approvers {
        if approver.is_blank() {
            return Err(PolicyError::InvalidPolicyTable(format!(
                "{context} has a blank approver"
            )));
        }
        if !seen.insert(approver) {
            return Err(PolicyError::InvalidPolicyTable(format!(
                "{context} lists {approver} twice"
            )));
        }
    }
    Ok(())
}

fn band(currency: Currency, min: Decimal, max: Option<Decimal>, approvers: &[&str]) -> ApprovalPolicy {
    let description = match max {
        Some(max) if min.is_zero() => format!("Under {} KRW", format_grouped(max)),
        Some(max) => format!(
            "{} KRW to under {} KRW",
            format_grouped(min),
            format_grouped(max)
        ),
        None => format!("{} KRW and above", format_grouped(min)),
    };

    ApprovalPolicy {
        currency,
        min_amount: min,
        max_amount: max,
        required_approvers: approvers.iter().copied().map(Approver::from).collect(),
        description,
    }
}

fn type_policy(
    transaction_type: TransactionType,
    description: &str,
    approvers: &[&str],
) -> TransactionTypePolicy {
    TransactionTypePolicy {
        transaction_type,
        description: description.to_string(),
        additional_approvers: approvers.iter().copied().map(Approver::from).collect(),
    }
}
