//! HTTP request handlers.

pub mod admin;
pub mod claim_events;
pub mod notification;
