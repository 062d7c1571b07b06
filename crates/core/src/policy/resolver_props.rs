//! Property-based tests for PolicyTable and PolicyResolver.

use std::sync::Arc;

use custody_shared::types::Currency;
use proptest::prelude::*;
use rust_decimal::Decimal;

use crate::currency::FixedRateTable;
use crate::policy::resolver::PolicyResolver;
use crate::policy::table::PolicyTable;
use crate::policy::types::TransactionType;

/// Strategy for generating non-negative KRW-range amounts with cents.
fn arb_amount() -> impl Strategy<Value = Decimal> {
    (0i64..100_000_000_000i64).prop_map(|n| Decimal::new(n, 2))
}

fn arb_currency() -> impl Strategy<Value = Currency> {
    prop::sample::select(Currency::ALL.to_vec())
}

fn arb_transaction_type() -> impl Strategy<Value = Option<TransactionType>> {
    prop_oneof![
        Just(None),
        Just(Some(TransactionType::HighRisk)),
        Just(Some(TransactionType::CrossBorder)),
        Just(Some(TransactionType::LargeValue)),
        Just(Some(TransactionType::NewAddress)),
    ]
}

fn resolver() -> PolicyResolver {
    let rates = FixedRateTable::from_config(&custody_shared::RatesConfig::default())
        .expect("default rates are valid");
    PolicyResolver::new(PolicyTable::reference(), Arc::new(rates)).expect("reference table")
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Every non-negative amount falls into exactly one band per currency.
    #[test]
    fn prop_bands_partition_amounts(
        amount in arb_amount(),
        currency in arb_currency()
    ) {
        let table = PolicyTable::reference();
        let matches = table
            .policies_for(currency)
            .filter(|p| p.contains(amount))
            .count();
        prop_assert_eq!(matches, 1);
    }

    /// Same inputs always produce the same ordered chain.
    #[test]
    fn prop_resolution_is_deterministic(
        amount in arb_amount(),
        currency in arb_currency(),
        transaction_type in arb_transaction_type()
    ) {
        let resolver = resolver();
        let first = resolver.resolve_required_approvers(amount, currency, transaction_type);
        let second = resolver.resolve_required_approvers(amount, currency, transaction_type);
        prop_assert!(first.is_ok());
        prop_assert_eq!(first, second);
    }

    /// The chain starts with the band approvers and never repeats a name.
    #[test]
    fn prop_chain_extends_band_without_duplicates(
        amount in arb_amount(),
        currency in arb_currency(),
        transaction_type in arb_transaction_type()
    ) {
        let resolver = resolver();
        let base = resolver.resolve_required_approvers(amount, currency, None).unwrap();
        let tagged = resolver
            .resolve_required_approvers(amount, currency, transaction_type)
            .unwrap();

        prop_assert!(!base.is_empty());
        prop_assert_eq!(&tagged[..base.len()], &base[..]);

        let mut unique = tagged.clone();
        unique.sort();
        unique.dedup();
        prop_assert_eq!(unique.len(), tagged.len());
    }

    /// A larger amount never needs fewer band approvers.
    #[test]
    fn prop_chain_grows_with_amount(
        a in arb_amount(),
        b in arb_amount(),
        currency in arb_currency()
    ) {
        let resolver = resolver();
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        let low_chain = resolver.resolve_required_approvers(low, currency, None).unwrap();
        let high_chain = resolver.resolve_required_approvers(high, currency, None).unwrap();
        prop_assert!(low_chain.len() <= high_chain.len());
    }
}
