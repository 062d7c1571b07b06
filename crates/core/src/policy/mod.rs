//! Approval policy resolution.
//!
//! This module decides which approvers a transaction needs, based on its
//! amount band per currency and optional risk tags.
//!
//! # Modules
//!
//! - `types` - Policy domain types (ApprovalPolicy, TransactionTypePolicy, Approver)
//! - `table` - Immutable policy tables and their validation
//! - `resolver` - Amount normalization and approver-chain resolution
//! - `error` - Policy-specific error types

pub mod error;
pub mod resolver;
pub mod table;
pub mod types;

#[cfg(test)]
mod resolver_props;

pub use error::PolicyError;
pub use resolver::PolicyResolver;
pub use table::PolicyTable;
pub use types::{
    ApprovalPolicy, Approver, PolicyDescription, TransactionType, TransactionTypePolicy,
};
