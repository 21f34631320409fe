//! Configuration validation

use crate::schema::RawConfig;
use chrono::NaiveTime;
use thiserror::Error;

/// Validation error
#[derive(Debug, Clone, Error)]
pub enum ValidationError {
    #[error("Invalid time format '{value}': {message}")]
    InvalidTimeFormat { value: String, message: String },

    #[error("Default session window is empty or inverted: {start} >= {end}")]
    InvalidDefaultWindow { start: String, end: String },

    #[error("Unknown claim policy: {0}")]
    UnknownClaimPolicy(String),
}

/// Validate a raw configuration
pub fn validate_config(config: &RawConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    let mut start = None;
    let mut end = None;

    if let Some(value) = &config.session_defaults.start_time {
        match parse_time(value) {
            Ok(t) => start = Some(t),
            Err(message) => errors.push(ValidationError::InvalidTimeFormat {
                value: value.clone(),
                message,
            }),
        }
    }

    if let Some(value) = &config.session_defaults.end_time {
        match parse_time(value) {
            Ok(t) => end = Some(t),
            Err(message) => errors.push(ValidationError::InvalidTimeFormat {
                value: value.clone(),
                message,
            }),
        }
    }

    // Only check ordering when both sides parsed
    if let (Some(start), Some(end)) = (start, end)
        && start >= end
    {
        errors.push(ValidationError::InvalidDefaultWindow {
            start: start.format("%H:%M").to_string(),
            end: end.format("%H:%M").to_string(),
        });
    }

    if let Some(policy) = &config.claim_policy
        && parse_claim_policy(policy).is_none()
    {
        errors.push(ValidationError::UnknownClaimPolicy(policy.clone()));
    }

    errors
}

/// Parse HH:MM time format
pub fn parse_time(s: &str) -> Result<NaiveTime, String> {
    let parts: Vec<&str> = s.split(':').collect();
    if parts.len() != 2 {
        return Err("Expected HH:MM format".into());
    }

    let hour: u32 = parts[0].parse().map_err(|_| "Invalid hour".to_string())?;
    let minute: u32 = parts[1].parse().map_err(|_| "Invalid minute".to_string())?;

    if hour >= 24 {
        return Err("Hour must be 0-23".into());
    }
    if minute >= 60 {
        return Err("Minute must be 0-59".into());
    }

    NaiveTime::from_hms_opt(hour, minute, 0).ok_or_else(|| "Invalid time".into())
}

/// Parse a claim policy name; None for unknown values
pub fn parse_claim_policy(s: &str) -> Option<crate::ClaimPolicy> {
    match s {
        "any-tutor" => Some(crate::ClaimPolicy::AnyTutor),
        "admin-only" => Some(crate::ClaimPolicy::AdminOnly),
        _ => None,
    }
}
