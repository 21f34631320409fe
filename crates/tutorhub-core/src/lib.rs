//! Lifecycle engine for tutorhubd
//!
//! This crate is the heart of tutorhubd, containing:
//! - Request lifecycle (Pending -> Accepted | Declined, one-way)
//! - Session lifecycle (Pending -> Accepted -> Completed, with cancellation)
//! - The accept transition that atomically materializes a session from a
//!   pending request
//! - Visibility and authorization rules consumed by dashboards

mod blueprint;
mod engine;

pub use blueprint::*;
pub use engine::*;
