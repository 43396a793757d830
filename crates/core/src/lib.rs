//! Claimdesk domain primitives.
//!
//! Pure types and functions shared by every other crate. This crate has no
//! internal dependencies and never touches the database or the network, so
//! the scheduling and content logic here is testable in isolation.

pub mod cadence;
pub mod channels;
pub mod error;
pub mod roles;
pub mod summary;
pub mod types;
