//! Required-approver resolution.
//!
//! Maps `(amount, currency, tag)` to the ordered approver chain a request
//! must collect. The chain order is the order approvers must act in.

use std::sync::Arc;

use custody_shared::types::Currency;
use rust_decimal::Decimal;

use crate::currency::{RateProvider, convert_amount};
use crate::policy::error::PolicyError;
use crate::policy::table::PolicyTable;
use crate::policy::types::{
    ApprovalPolicy, Approver, PolicyDescription, TransactionType, TransactionTypePolicy,
};

/// Resolves approver chains against an injected policy table.
///
/// Cheap to clone; the table and rate provider are shared.
#[derive(Clone)]
pub struct PolicyResolver {
    table: Arc<PolicyTable>,
    rates: Arc<dyn RateProvider>,
}

impl PolicyResolver {
    /// Creates a resolver, validating the table first.
    pub fn new(table: PolicyTable, rates: Arc<dyn RateProvider>) -> Result<Self, PolicyError> {
        table.validate()?;
        Ok(Self {
            table: Arc::new(table),
            rates,
        })
    }

    /// The policy table this resolver reads.
    #[must_use]
    pub fn table(&self) -> &PolicyTable {
        &self.table
    }

    /// Converts `amount` of `currency` into base-currency units.
    pub fn normalize(&self, amount: Decimal, currency: Currency) -> Result<Decimal, PolicyError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PolicyError::NegativeAmount(amount));
        }

        let base = self.table.base_currency();
        let rate = self
            .rates
            .rate(currency, base)
            .ok_or(PolicyError::RateUnavailable {
                from: currency,
                to: base,
            })?;

        convert_amount(amount, rate.rate, base.decimal_places())
            .ok_or(PolicyError::AmountOutOfRange { currency, amount })
    }

    /// Returns the ordered approver chain for a transaction.
    ///
    /// # Arguments
    /// * `amount` - The transaction amount, in `currency` units
    /// * `currency` - The transaction currency
    /// * `transaction_type` - Optional tag pulling in additional approvers
    ///
    /// # Returns
    /// * `Ok(approvers)` - band approvers followed by tag approvers not already listed
    /// * `Err(PolicyError::PolicyNotFound)` if no band covers the amount
    pub fn resolve_required_approvers(
        &self,
        amount: Decimal,
        currency: Currency,
        transaction_type: Option<TransactionType>,
    ) -> Result<Vec<Approver>, PolicyError> {
        let (_, band, type_policy) = self.lookup(amount, currency, transaction_type)?;
        Ok(chain(band, type_policy))
    }

    /// Resolves the chain and explains how it was derived.
    pub fn describe_policy(
        &self,
        amount: Decimal,
        currency: Currency,
        transaction_type: Option<TransactionType>,
    ) -> Result<PolicyDescription, PolicyError> {
        let (normalized_amount, band, type_policy) =
            self.lookup(amount, currency, transaction_type)?;
        let required_approvers = chain(band, type_policy);

        let names: Vec<&str> = required_approvers.iter().map(Approver::as_str).collect();
        let mut summary = format!("{}: {}", band.description, names.join(" → "));
        if let Some(tp) = type_policy {
            summary.push_str(&format!(" [{}: {}]", tp.transaction_type, tp.description));
        }

        Ok(PolicyDescription {
            currency,
            amount,
            base_currency: self.table.base_currency(),
            normalized_amount,
            band: band.clone(),
            type_policy: type_policy.cloned(),
            required_approvers,
            summary,
        })
    }

    fn lookup(
        &self,
        amount: Decimal,
        currency: Currency,
        transaction_type: Option<TransactionType>,
    ) -> Result<(Decimal, &ApprovalPolicy, Option<&TransactionTypePolicy>), PolicyError> {
        let normalized = self.normalize(amount, currency)?;

        let band = self
            .table
            .policies_for(currency)
            .find(|p| p.contains(normalized))
            .ok_or(PolicyError::PolicyNotFound { currency, amount })?;

        let type_policy = transaction_type.and_then(|t| self.table.type_policy(t));

        Ok((normalized, band, type_policy))
    }
}

fn chain(band: &ApprovalPolicy, type_policy: Option<&TransactionTypePolicy>) -> Vec<Approver> {
    let mut approvers = band.required_approvers.clone();
    if let Some(tp) = type_policy {
        for extra in &tp.additional_approvers {
            if !approvers.contains(extra) {
                approvers.push(extra.clone());
            }
        }
    }
    approvers
}
