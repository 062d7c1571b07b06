//! Request storage and workflow repositories.
//!
//! This crate provides:
//! - An in-memory request store with per-request locking
//! - Optimistic version checks on every transition
//! - The workflow repository that applies core transitions to stored requests

pub mod repositories;

pub use repositories::{RequestFilter, RequestRepository, Transition, WorkflowRepository};
