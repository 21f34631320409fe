//! Shared utilities for tutorhub
//!
//! This crate provides:
//! - ID types (UserId, RequestId, SessionId, ClientId)
//! - Error types
//! - Time helpers (current time with mock support for development)
//! - Rate limiting helpers
//! - Default paths for socket, data, and config locations

mod error;
mod ids;
mod paths;
mod rate_limit;
mod time;

pub use error::*;
pub use ids::*;
pub use paths::*;
pub use rate_limit::*;
pub use time::*;
