//! Core business logic for the custody approval workflow.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! All domain types, validation rules, and state derivations live here.
//!
//! # Modules
//!
//! - `currency` - Exchange rates and base-currency normalization
//! - `policy` - Approval policy tables and required-approver resolution
//! - `workflow` - Sequential approval state machine and request transitions

pub mod currency;
pub mod policy;
pub mod workflow;
