//! Shared types, errors, and configuration for the custody back office.
//!
//! This crate provides common types used across all other crates:
//! - Money and currency types with decimal precision
//! - Typed IDs for type-safe entity references
//! - Pagination types for list endpoints
//! - Application-wide error types
//! - Configuration management

pub mod config;
pub mod error;
pub mod types;

pub use config::{AppConfig, RatesConfig, ServerConfig, WorkflowConfig};
pub use error::{AppError, AppResult};
