//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface over request storage,
//! hiding locking and versioning from the rest of the application.

pub mod request;
pub mod workflow;

pub use request::{RequestFilter, RequestRepository};
pub use workflow::{Transition, WorkflowRepository};
